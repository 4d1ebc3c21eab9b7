// 连接状态 store - 被动记录，由外部传输层写入

use tracing::debug;

use super::writable::{SubscriptionId, Writable};
use crate::models::{ConnectionStatus, ConnectionStatusUpdate};

/// 连接状态
#[derive(Clone)]
pub struct ConnectionStore {
    store: Writable<ConnectionStatus>,
}

impl Default for ConnectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStore {
    /// 默认：未连接、0 次重连、无最后连接时间
    pub fn new() -> Self {
        Self {
            store: Writable::new(ConnectionStatus::default()),
        }
    }

    pub fn get(&self) -> ConnectionStatus {
        self.store.get()
    }

    /// 合并部分字段后整体替换，不做任何校验
    pub fn update(&self, update: &ConnectionStatusUpdate) -> ConnectionStatus {
        let next = self.store.update(|current| update.apply(current));
        debug!("连接状态已更新: {:?}", next);
        next
    }

    /// 整体替换
    pub fn replace(&self, status: ConnectionStatus) {
        debug!("连接状态已替换: {:?}", status);
        self.store.set(status);
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ConnectionStatus) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
