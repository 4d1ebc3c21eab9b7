//! Tauri 命令模块（desktop 特性）
//!
//! 提供前端调用的所有 Tauri 命令接口，按功能分组：
//! - ui_state: 主题、连接状态、通知
//! - members: 成员列表/详情
//! - config: 配置管理
//! - events: 把事件总线转发到 webview

pub mod config;
pub mod events;
pub mod members;
pub mod ui_state;

// 重新导出所有命令
pub use config::*;
pub use events::forward_events;
pub use members::*;
pub use ui_state::*;

use tauri::Manager;

use crate::AppState;

/// 注册状态和全部命令的 Tauri Builder
pub fn builder(state: AppState) -> tauri::Builder<tauri::Wry> {
    tauri::Builder::default()
        .manage(state)
        .setup(|app| {
            let state = app.state::<AppState>();
            forward_events(app.handle().clone(), &state.event_bus);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_theme,
            set_theme,
            toggle_theme,
            get_connection_status,
            update_connection_status,
            list_notifications,
            add_notification,
            remove_notification,
            clear_notifications,
            get_roster,
            get_member,
            get_app_config,
            update_config,
        ])
}
