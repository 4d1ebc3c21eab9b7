// 主题偏好 store
//
// 初始化与副作用注册都由宿主显式调用（见 AppState::initialize），store 本身不做任何 I/O

use tracing::{debug, info, warn};

use super::writable::{SubscriptionId, Writable};
use crate::environment::HostEnvironment;

/// 主题偏好的存储键
pub const THEME_STORAGE_KEY: &str = "venti-theme";

/// 深色模式下根元素上的 class
pub const DARK_CLASS: &str = "dark";

/// 根据已保存的值和系统偏好得出初始主题
///
/// 已保存的值非空时以它为准（只有 "dark" 视为深色），否则跟随系统
pub fn resolve_initial_theme(stored: Option<&str>, prefers_dark: bool) -> bool {
    match stored {
        Some(value) if !value.is_empty() => value == "dark",
        _ => prefers_dark,
    }
}

fn storage_value(is_dark: bool) -> &'static str {
    if is_dark {
        "dark"
    } else {
        "light"
    }
}

/// 主题偏好
#[derive(Clone)]
pub struct ThemeStore {
    store: Writable<bool>,
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeStore {
    /// 默认浅色
    pub fn new() -> Self {
        Self {
            store: Writable::new(false),
        }
    }

    /// 从持久化存储或系统偏好初始化，返回初始值
    ///
    /// 无头环境下整体跳过，保持默认值
    pub fn initialize(&self, env: &HostEnvironment) -> bool {
        let (Some(storage), Some(display)) = (env.storage(), env.display()) else {
            debug!("非交互环境，跳过主题初始化");
            return self.is_dark();
        };

        let stored = match storage.get_item(THEME_STORAGE_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!("读取主题偏好失败，按未保存处理: {}", e);
                None
            }
        };

        let is_dark = resolve_initial_theme(stored.as_deref(), display.prefers_dark());
        info!(
            "主题初始化: {} (已保存: {:?})",
            storage_value(is_dark),
            stored
        );
        self.store.set(is_dark);
        is_dark
    }

    /// 注册副作用：写回存储并切换根元素 class
    ///
    /// 订阅时会立即以当前值执行一次；无头环境返回 None
    pub fn attach(&self, env: &HostEnvironment) -> Option<SubscriptionId> {
        let storage = env.storage()?.clone();
        let display = env.display()?.clone();

        Some(self.store.subscribe(move |is_dark| {
            if let Err(e) = storage.set_item(THEME_STORAGE_KEY, storage_value(*is_dark)) {
                warn!("保存主题偏好失败: {}", e);
            }
            display.toggle_root_class(DARK_CLASS, *is_dark);
        }))
    }

    pub fn is_dark(&self) -> bool {
        self.store.get()
    }

    pub fn set(&self, is_dark: bool) {
        debug!("主题切换为: {}", storage_value(is_dark));
        self.store.set(is_dark);
    }

    /// 切换深浅色，返回新值
    pub fn toggle(&self) -> bool {
        let next = self.store.update(|is_dark| !is_dark);
        debug!("主题切换为: {}", storage_value(next));
        next
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
