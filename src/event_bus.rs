// 事件总线 - 用于模块间解耦通信
//
// 实现发布/订阅模式,把同步 store 的变化转发给异步消费者（桌面壳、日志推送等）
// 使用 tokio::sync::broadcast 实现高效的事件分发

use tokio::sync::broadcast;

use crate::logger::LogMessage;
use crate::models::{ConnectionStatus, Notification};

/// 应用事件枚举 - 定义所有可能的系统事件
#[derive(Debug, Clone)]
pub enum AppEvent {
    // --- 界面状态事件 ---

    /// 主题变化
    ThemeChanged {
        is_dark: bool,
    },

    /// 连接状态变化
    ConnectionChanged {
        status: ConnectionStatus,
    },

    /// 通知队列变化
    NotificationsChanged {
        notifications: Vec<Notification>,
    },

    /// 通知因超时被移除
    NotificationExpired {
        id: String,
    },

    // --- 成员数据事件 ---

    /// 成员列表加载完成
    MembersLoaded {
        source: String,
        count: usize,
    },

    /// 成员列表加载失败
    MembersLoadFailed {
        source: String,
        error: String,
    },

    // --- 系统事件 ---

    /// 配置更新事件
    ConfigUpdated,

    /// 日志消息
    Log(LogMessage),
}

impl AppEvent {
    /// 前端事件名
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::ThemeChanged { .. } => "theme-changed",
            AppEvent::ConnectionChanged { .. } => "connection-changed",
            AppEvent::NotificationsChanged { .. } => "notifications-changed",
            AppEvent::NotificationExpired { .. } => "notification-expired",
            AppEvent::MembersLoaded { .. } => "members-loaded",
            AppEvent::MembersLoadFailed { .. } => "members-load-failed",
            AppEvent::ConfigUpdated => "config-updated",
            AppEvent::Log(_) => "log-message",
        }
    }
}

/// 事件总线 - 用于模块间解耦通信
///
/// 使用 broadcast channel 实现发布/订阅模式
/// 支持多个订阅者同时接收事件
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    ///
    /// # 参数
    /// - `capacity`: 事件缓冲区大小,建议 100-1000
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件
    ///
    /// 如果没有订阅者,事件会被丢弃(这是正常的)
    pub fn publish(&self, event: AppEvent) {
        // 日志事件不再打 trace，避免日志层递归
        let traced = !matches!(event, AppEvent::Log(_));
        match self.sender.send(event) {
            Ok(receiver_count) if traced => {
                tracing::trace!("事件已发布，订阅者数量: {}", receiver_count);
            }
            Err(_) if traced => {
                tracing::trace!("事件已发布但无订阅者");
            }
            _ => {}
        }
    }

    /// 订阅事件
    ///
    /// 返回一个接收器,可以用 `.recv().await` 接收事件
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// 获取当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
