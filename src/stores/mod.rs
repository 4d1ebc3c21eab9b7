// 界面状态模块 - 三个相互独立、可订阅的 store
//
// - theme: 深浅色主题偏好（持久化）
// - connection: 外部传输层的连接状态（被动记录）
// - notifications: 带自动过期的通知队列

pub mod connection;
pub mod notifications;
pub mod theme;
pub mod writable;

pub use connection::ConnectionStore;
pub use notifications::NotificationQueue;
pub use theme::{resolve_initial_theme, ThemeStore, DARK_CLASS, THEME_STORAGE_KEY};
pub use writable::{SubscriptionId, Writable};
