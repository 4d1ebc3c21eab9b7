// 成员名录命令行入口
//
// 用法:
//   venti roster                                   列出全部成员
//   venti member <id>                              查看单个成员
//   venti theme [dark|light|toggle]                查看/设置主题偏好
//   venti import <wiki.json> <site.json> <out.json> 合并清洗原始表格数据
//   venti desktop                                  启动桌面壳（需要 desktop 特性）

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use venti_lib::logger::{self, LogBroadcaster};
use venti_lib::members::{import_members, RawRow};
use venti_lib::settings::{default_data_dir, SettingsManager};
use venti_lib::{session_environment, AppState};

const USAGE: &str = "用法: venti <roster | member <id> | theme [dark|light|toggle] | import <wiki.json> <site.json> <out.json> | desktop>";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let data_dir = std::env::var("VENTI_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_data_dir());
    let settings = Arc::new(SettingsManager::new(data_dir.join("settings.json")).await?);
    let config = settings.get().await;

    let broadcaster = Arc::new(LogBroadcaster::new());
    let _guard = logger::init_with_broadcaster(
        broadcaster.clone(),
        &logger::default_log_dir(),
        logger::parse_level(&config.logger_settings.level),
    )?;

    let state = AppState::new(settings.clone(), broadcaster).await?;
    let command = args.first().map(String::as_str);

    // 只有主题命令和桌面壳需要读写偏好存储、探测系统配色
    let needs_theme = matches!(command, Some("theme" | "desktop"));
    let env = session_environment(&settings, needs_theme).await?;
    state.initialize(&env);

    match command {
        Some("roster") => {
            let page = state.members.roster_page().await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Some("member") => {
            let id = args.get(1).ok_or_else(|| anyhow!("缺少成员ID\n{}", USAGE))?;
            let page = state.members.member_page(id).await?;
            match page.member {
                Some(member) => println!("{}", serde_json::to_string_pretty(&member)?),
                None => println!("未找到成员: {}", id),
            }
        }
        Some("theme") => {
            match args.get(1).map(String::as_str) {
                Some("dark") => state.theme.set(true),
                Some("light") => state.theme.set(false),
                Some("toggle") => {
                    state.theme.toggle();
                }
                Some(other) => bail!("未知的主题: {}\n{}", other, USAGE),
                None => {}
            }
            println!("{}", if state.theme.is_dark() { "dark" } else { "light" });
        }
        Some("import") => {
            let (wiki, site, out) = match &args[1..] {
                [wiki, site, out] => (wiki, site, out),
                _ => bail!("参数数量不正确\n{}", USAGE),
            };
            let wiki_rows = read_rows(wiki).await?;
            let site_rows = read_rows(site).await?;
            let members = import_members(&wiki_rows, &site_rows);

            if let Some(parent) = PathBuf::from(out).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            tokio::fs::write(out, serde_json::to_string_pretty(&members)?)
                .await
                .with_context(|| format!("写入成员数据失败: {}", out))?;
            info!("已导出 {} 位成员到 {}", members.len(), out);
        }
        #[cfg(feature = "desktop")]
        Some("desktop") => {
            // 桌面壳和命令行共用同一个 tokio 运行时
            tauri::async_runtime::set(tokio::runtime::Handle::current());
            state.spawn_connection_actor();
            venti_lib::run(state)?;
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

/// 读取原始表格行；文件不存在时视为没有数据
async fn read_rows(path: &str) -> Result<Vec<RawRow>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .with_context(|| format!("原始数据格式错误: {}", path)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("文件不存在: {}", path);
            Ok(Vec::new())
        }
        Err(e) => Err(e).with_context(|| format!("读取原始数据失败: {}", path)),
    }
}
