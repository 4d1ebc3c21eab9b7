//! 界面状态命令
//!
//! 主题、连接状态和通知队列的读写接口

use crate::models::{ConnectionStatus, ConnectionStatusUpdate, Notification, Severity};
use crate::AppState;

/// 获取当前主题（是否深色）
#[tauri::command]
pub async fn get_theme(state: tauri::State<'_, AppState>) -> Result<bool, String> {
    Ok(state.theme.is_dark())
}

/// 设置主题
#[tauri::command]
pub async fn set_theme(state: tauri::State<'_, AppState>, is_dark: bool) -> Result<(), String> {
    state.theme.set(is_dark);
    Ok(())
}

/// 切换主题，返回新值
#[tauri::command]
pub async fn toggle_theme(state: tauri::State<'_, AppState>) -> Result<bool, String> {
    Ok(state.theme.toggle())
}

/// 获取连接状态
#[tauri::command]
pub async fn get_connection_status(
    state: tauri::State<'_, AppState>,
) -> Result<ConnectionStatus, String> {
    Ok(state.connection.get())
}

/// 部分更新连接状态
#[tauri::command]
pub async fn update_connection_status(
    state: tauri::State<'_, AppState>,
    update: ConnectionStatusUpdate,
) -> Result<ConnectionStatus, String> {
    Ok(state.connection.update(&update))
}

/// 获取通知列表
#[tauri::command]
pub async fn list_notifications(
    state: tauri::State<'_, AppState>,
) -> Result<Vec<Notification>, String> {
    Ok(state.notifications.list())
}

/// 添加通知，未指定超时时使用配置的默认值
#[tauri::command]
pub async fn add_notification(
    state: tauri::State<'_, AppState>,
    severity: Severity,
    message: String,
    timeout: Option<u64>,
) -> Result<String, String> {
    let timeout = timeout.unwrap_or_else(|| state.notifications.default_timeout_ms());
    Ok(state.notifications.add(severity, message, timeout))
}

/// 移除通知
#[tauri::command]
pub async fn remove_notification(
    state: tauri::State<'_, AppState>,
    id: String,
) -> Result<(), String> {
    state.notifications.remove(&id);
    Ok(())
}

/// 清空通知
#[tauri::command]
pub async fn clear_notifications(state: tauri::State<'_, AppState>) -> Result<(), String> {
    state.notifications.clear();
    Ok(())
}
