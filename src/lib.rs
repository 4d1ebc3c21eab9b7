// 成员名录前端 - 应用状态主库

// 声明模块
pub mod actors;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod environment;
pub mod event_bus;
pub mod logger;
pub mod members;
pub mod models;
pub mod settings;
pub mod stores;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use actors::{ConnectionStatusActor, ConnectionStatusHandle};
use environment::{DocumentRoot, HostEnvironment, JsonFileStorage};
use event_bus::{AppEvent, EventBus};
use logger::LogBroadcaster;
use members::MemberPages;
use models::PersistedAppConfig;
use settings::SettingsManager;
use stores::{ConnectionStore, NotificationQueue, ThemeStore};

/// 事件总线容量
const EVENT_BUS_CAPACITY: usize = 256;

/// 应用状态
///
/// 三个界面 store 相互独立，各自可订阅：
/// - 主题偏好
/// - 连接状态
/// - 通知队列
///
/// 成员页面加载器、事件总线和设置管理器作为协作者一起挂在这里
#[derive(Clone)]
pub struct AppState {
    /// 主题偏好
    pub theme: ThemeStore,
    /// 连接状态
    pub connection: ConnectionStore,
    /// 通知队列
    pub notifications: NotificationQueue,
    /// 成员页面加载器
    pub members: MemberPages,
    /// 事件总线
    pub event_bus: Arc<EventBus>,
    /// 设置管理器
    pub settings: Arc<SettingsManager>,
    /// 日志推送器
    pub log_broadcaster: Arc<LogBroadcaster>,
    initialized: Arc<AtomicBool>,
}

impl AppState {
    /// 按配置组装应用状态（不做任何环境相关的初始化）
    pub async fn new(
        settings: Arc<SettingsManager>,
        log_broadcaster: Arc<LogBroadcaster>,
    ) -> Result<Self> {
        let config = settings.get().await;
        let event_bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));

        log_broadcaster.set_event_bus((*event_bus).clone());
        log_broadcaster.set_enabled(config.logger_settings.enable_event_logging);

        let source = members::from_config(&config.member_source)?;
        let members = MemberPages::new(source).with_event_bus(event_bus.clone());

        Ok(Self {
            theme: ThemeStore::new(),
            connection: ConnectionStore::new(),
            notifications: NotificationQueue::with_default_timeout(config.notification_timeout_ms),
            members,
            event_bus,
            settings,
            log_broadcaster,
            initialized: Arc::new(AtomicBool::new(false)),
        })
    }

    /// 会话启动时由宿主调用一次
    ///
    /// 初始化主题、注册副作用监听器，并把三个 store 的变化转发到事件总线。
    /// 返回初始主题（是否深色）。
    pub fn initialize(&self, env: &HostEnvironment) -> bool {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("应用状态已初始化，忽略重复调用");
            return self.theme.is_dark();
        }

        let is_dark = self.theme.initialize(env);
        self.theme.attach(env);
        self.bridge_events();

        info!(
            "应用状态初始化完成 (交互环境: {}, 深色: {})",
            env.is_interactive(),
            is_dark
        );
        is_dark
    }

    fn bridge_events(&self) {
        let bus = self.event_bus.clone();
        self.theme.subscribe(move |is_dark| {
            bus.publish(AppEvent::ThemeChanged { is_dark: *is_dark });
        });

        let bus = self.event_bus.clone();
        self.connection.subscribe(move |status| {
            bus.publish(AppEvent::ConnectionChanged {
                status: status.clone(),
            });
        });

        let bus = self.event_bus.clone();
        self.notifications.subscribe(move |notifications| {
            bus.publish(AppEvent::NotificationsChanged {
                notifications: notifications.clone(),
            });
        });

        let bus = self.event_bus.clone();
        self.notifications.on_expired(move |id| {
            bus.publish(AppEvent::NotificationExpired { id: id.to_string() });
        });
    }

    /// 启动连接状态 Actor，返回给传输层使用的 Handle
    pub fn spawn_connection_actor(&self) -> ConnectionStatusHandle {
        let (actor, handle) = ConnectionStatusActor::new(self.connection.clone());
        tokio::spawn(actor.run());
        handle
    }
}

/// 按配置构建可交互环境：文件存储 + 文档根元素
pub fn interactive_environment(
    config: &PersistedAppConfig,
    storage_path: &Path,
) -> Result<(HostEnvironment, Arc<DocumentRoot>)> {
    let storage = Arc::new(JsonFileStorage::open(storage_path)?);
    let prefers_dark = environment::color_scheme::resolve_prefers_dark(config.color_scheme);
    let root = Arc::new(DocumentRoot::new(prefers_dark));
    Ok((HostEnvironment::interactive(storage, root.clone()), root))
}

/// 启动桌面壳（webview），阻塞到窗口全部关闭
#[cfg(feature = "desktop")]
pub fn run(state: AppState) -> Result<()> {
    use anyhow::Context;

    info!("启动桌面壳");
    commands::builder(state)
        .run(tauri::generate_context!())
        .context("桌面壳运行失败")
}

/// 会话所需的宿主环境
///
/// 只有需要主题偏好的会话才打开偏好存储并探测系统配色，其余会话使用无头环境
pub async fn session_environment(
    settings: &SettingsManager,
    needs_theme: bool,
) -> Result<HostEnvironment> {
    if !needs_theme {
        return Ok(HostEnvironment::headless());
    }
    let config = settings.get().await;
    let storage_path = settings.theme_storage_path().await;
    let (env, _root) = interactive_environment(&config, &storage_path)?;
    Ok(env)
}
