// Connection Status Actor - 供运行在其他任务上的传输层使用
//
// 传输层只持有 Handle，通过消息把连接结果写进 ConnectionStore

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::models::{ConnectionStatus, ConnectionStatusUpdate};
use crate::stores::ConnectionStore;

/// 健康检查超时时间
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// 连接状态命令
pub enum ConnectionStatusCommand {
    /// 部分更新
    Update {
        update: ConnectionStatusUpdate,
    },

    /// 整体替换
    Replace {
        status: ConnectionStatus,
    },

    /// 获取状态
    Get {
        reply: oneshot::Sender<ConnectionStatus>,
    },

    /// 健康检查
    Ping {
        reply: oneshot::Sender<()>,
    },
}

/// 连接状态Actor
pub struct ConnectionStatusActor {
    receiver: mpsc::Receiver<ConnectionStatusCommand>,
    store: ConnectionStore,
}

impl ConnectionStatusActor {
    /// 创建新的Actor，写入给定的 store
    pub fn new(store: ConnectionStore) -> (Self, ConnectionStatusHandle) {
        let (sender, receiver) = mpsc::channel(50);
        let actor = Self { receiver, store };
        let handle = ConnectionStatusHandle { sender };
        (actor, handle)
    }

    /// 运行Actor
    pub async fn run(mut self) {
        tracing::info!("Connection Status Actor 已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ConnectionStatusCommand::Update { update } => {
                    self.store.update(&update);
                }

                ConnectionStatusCommand::Replace { status } => {
                    self.store.replace(status);
                }

                ConnectionStatusCommand::Get { reply } => {
                    let _ = reply.send(self.store.get());
                }

                ConnectionStatusCommand::Ping { reply } => {
                    let _ = reply.send(());
                }
            }
        }

        tracing::info!("Connection Status Actor 已停止");
    }
}

/// 连接状态Handle
#[derive(Clone)]
pub struct ConnectionStatusHandle {
    sender: mpsc::Sender<ConnectionStatusCommand>,
}

impl ConnectionStatusHandle {
    /// 部分更新
    pub async fn update(&self, update: ConnectionStatusUpdate) {
        let _ = self.sender.send(ConnectionStatusCommand::Update { update }).await;
    }

    /// 整体替换
    pub async fn replace(&self, status: ConnectionStatus) {
        let _ = self.sender.send(ConnectionStatusCommand::Replace { status }).await;
    }

    /// 获取连接状态，Actor 已停止时返回默认值
    pub async fn get(&self) -> ConnectionStatus {
        let (reply, rx) = oneshot::channel();
        self.sender.send(ConnectionStatusCommand::Get { reply }).await.ok();
        rx.await.unwrap_or_default()
    }

    /// 健康检查：Actor 在超时时间内应答即为健康
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self.sender.send(ConnectionStatusCommand::Ping { reply }).await.is_err() {
            return false;
        }
        matches!(tokio::time::timeout(HEALTH_CHECK_TIMEOUT, rx).await, Ok(Ok(())))
    }
}
