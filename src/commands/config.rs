//! 配置管理命令
//!
//! 提供应用配置的读取和更新接口。
//! 成员数据源和通知默认超时在下次启动时生效。

use tracing::info;

use crate::event_bus::AppEvent;
use crate::models::{AppConfig, PersistedAppConfig};
use crate::AppState;

/// 获取应用配置
#[tauri::command]
pub async fn get_app_config(
    state: tauri::State<'_, AppState>,
) -> Result<PersistedAppConfig, String> {
    Ok(state.settings.get().await)
}

/// 更新配置
#[tauri::command]
pub async fn update_config(
    state: tauri::State<'_, AppState>,
    config: AppConfig,
) -> Result<PersistedAppConfig, String> {
    let updated_config = state
        .settings
        .update(config.clone())
        .await
        .map_err(|e| e.to_string())?;

    // 日志推送开关立即生效
    if let Some(logger_settings) = config.logger_settings {
        state
            .log_broadcaster
            .set_enabled(logger_settings.enable_event_logging);
        info!(
            "日志配置已更新: 事件日志推送 = {}",
            logger_settings.enable_event_logging
        );
    }

    state.event_bus.publish(AppEvent::ConfigUpdated);
    Ok(updated_config)
}
