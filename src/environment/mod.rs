//! 宿主环境抽象
//!
//! 主题偏好依赖两类能力：
//! - 持久化键值存储（对应浏览器的 localStorage）
//! - 显示表面（根元素 class 列表 + 系统配色查询）
//!
//! 两者都存在时才视为"可交互环境"；无头环境下主题初始化整体跳过。

pub mod color_scheme;
pub mod display;
pub mod local_storage;

use std::sync::Arc;

use anyhow::Result;

pub use color_scheme::detect_system_dark_mode;
pub use display::DocumentRoot;
pub use local_storage::{JsonFileStorage, MemoryStorage};

/// 持久化键值存储
pub trait KeyValueStorage: Send + Sync {
    /// 读取键值，不存在时返回 None
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// 写入键值
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// 显示表面
pub trait DisplaySurface: Send + Sync {
    /// 系统当前是否偏好深色
    fn prefers_dark(&self) -> bool;

    /// 在根元素上开关某个 class
    fn toggle_root_class(&self, class: &str, enabled: bool);
}

/// 宿主环境
#[derive(Clone, Default)]
pub struct HostEnvironment {
    storage: Option<Arc<dyn KeyValueStorage>>,
    display: Option<Arc<dyn DisplaySurface>>,
}

impl HostEnvironment {
    /// 无头环境（没有存储也没有显示表面）
    pub fn headless() -> Self {
        Self::default()
    }

    /// 可交互环境
    pub fn interactive(
        storage: Arc<dyn KeyValueStorage>,
        display: Arc<dyn DisplaySurface>,
    ) -> Self {
        Self {
            storage: Some(storage),
            display: Some(display),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.storage.is_some() && self.display.is_some()
    }

    pub fn storage(&self) -> Option<&Arc<dyn KeyValueStorage>> {
        self.storage.as_ref()
    }

    pub fn display(&self) -> Option<&Arc<dyn DisplaySurface>> {
        self.display.as_ref()
    }
}
