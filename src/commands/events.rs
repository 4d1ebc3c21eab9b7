//! 事件转发 - 把事件总线上的事件发送到 webview

use tauri::{AppHandle, Emitter, Runtime};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::event_bus::{AppEvent, EventBus};

/// 订阅事件总线并持续转发，直到总线关闭
pub fn forward_events<R: Runtime>(app: AppHandle<R>, bus: &EventBus) {
    let mut receiver = bus.subscribe();

    tauri::async_runtime::spawn(async move {
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("事件转发落后，丢弃了 {} 个事件", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let name = event.name();
            let result = match event {
                AppEvent::ThemeChanged { is_dark } => app.emit(name, is_dark),
                AppEvent::ConnectionChanged { status } => app.emit(name, status),
                AppEvent::NotificationsChanged { notifications } => app.emit(name, notifications),
                AppEvent::NotificationExpired { id } => app.emit(name, id),
                AppEvent::MembersLoaded { source, count } => app.emit(
                    name,
                    serde_json::json!({ "source": source, "count": count }),
                ),
                AppEvent::MembersLoadFailed { source, error } => app.emit(
                    name,
                    serde_json::json!({ "source": source, "error": error }),
                ),
                AppEvent::ConfigUpdated => app.emit(name, ()),
                AppEvent::Log(log) => app.emit(name, log),
            };

            if let Err(e) = result {
                // 这里不能再打 warn，否则日志事件会循环转发
                eprintln!("事件转发失败 [{}]: {}", name, e);
            }
        }
    });
}
