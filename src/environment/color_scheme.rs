//! 系统配色探测
//!
//! 按平台读取系统深色模式设置，探测失败时默认浅色

use tracing::debug;

use crate::models::ColorSchemePreference;

/// 一次探测的结果：来源 + 是否深色
type Detection = (&'static str, bool);

/// 探测系统是否处于深色模式
pub fn detect_system_dark_mode() -> bool {
    match query_platform() {
        Some((source, is_dark)) => {
            debug!("系统配色来自 {}: {}", source, if is_dark { "dark" } else { "light" });
            is_dark
        }
        None => {
            debug!("未探测到系统配色，按浅色处理");
            false
        }
    }
}

// AppsUseLightTheme: 0 = 深色, 1 = 浅色
#[cfg(target_os = "windows")]
fn query_platform() -> Option<Detection> {
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    let personalize = RegKey::predef(HKEY_CURRENT_USER)
        .open_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize")
        .ok()?;
    let value: u32 = personalize.get_value("AppsUseLightTheme").ok()?;
    Some(("registry AppsUseLightTheme", value == 0))
}

// GNOME: 先看 color-scheme，再看主题名里是否带 dark
#[cfg(target_os = "linux")]
fn query_platform() -> Option<Detection> {
    let scheme = command_output("gsettings", &["get", "org.gnome.desktop.interface", "color-scheme"]);
    if let Some(scheme) = scheme.filter(|s| s.contains("prefer-dark")) {
        debug!("gsettings color-scheme = {}", scheme.trim());
        return Some(("gsettings color-scheme", true));
    }

    let theme = command_output("gsettings", &["get", "org.gnome.desktop.interface", "gtk-theme"])?;
    Some(("gsettings gtk-theme", theme.to_lowercase().contains("dark")))
}

// 浅色模式下 AppleInterfaceStyle 不存在，命令以非零状态退出
#[cfg(target_os = "macos")]
fn query_platform() -> Option<Detection> {
    let style = command_output("defaults", &["read", "-g", "AppleInterfaceStyle"])
        .unwrap_or_default();
    Some(("defaults AppleInterfaceStyle", style.to_lowercase().contains("dark")))
}

#[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
fn query_platform() -> Option<Detection> {
    None
}

/// 执行命令并返回标准输出；命令不存在或失败时返回 None
#[cfg(any(target_os = "linux", target_os = "macos"))]
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = std::process::Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        debug!("{} 退出状态: {}", program, output.status);
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// 结合配置得出"系统偏好"：配置强制时不再探测
pub fn resolve_prefers_dark(preference: ColorSchemePreference) -> bool {
    match preference {
        ColorSchemePreference::Dark => true,
        ColorSchemePreference::Light => false,
        ColorSchemePreference::System => detect_system_dark_mode(),
    }
}
