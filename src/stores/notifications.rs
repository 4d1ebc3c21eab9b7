// 通知队列
//
// 按插入顺序展示；timeout_ms > 0 的通知在 tokio 定时任务中自动移除。
// 每个定时任务的 AbortHandle 和通知ID一起保存，手动移除时直接取消定时器。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use super::writable::{SubscriptionId, Writable};
use crate::models::{Notification, Severity, DEFAULT_NOTIFICATION_TIMEOUT_MS};

/// 通知ID生成器
///
/// 以毫秒时间戳为ID；时间戳没有前进时追加计数后缀，保证不重复
struct IdGenerator {
    last: Mutex<(i64, u32)>,
}

impl IdGenerator {
    fn new() -> Self {
        Self {
            last: Mutex::new((i64::MIN, 0)),
        }
    }

    fn next(&self) -> String {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if now > last.0 {
            *last = (now, 0);
            now.to_string()
        } else {
            last.1 += 1;
            format!("{}-{}", last.0, last.1)
        }
    }
}

struct QueueInner {
    store: Writable<Vec<Notification>>,
    timers: Mutex<HashMap<String, AbortHandle>>,
    ids: IdGenerator,
    default_timeout_ms: u64,
    on_expired: Mutex<Option<Box<dyn Fn(&str) + Send + Sync>>>,
}

impl QueueInner {
    /// 从队列中移除，返回是否确实移除了
    fn remove_entry(&self, id: &str) -> bool {
        let mut removed = false;
        self.store.update(|notifications| {
            let next: Vec<Notification> = notifications
                .iter()
                .filter(|n| n.id != id)
                .cloned()
                .collect();
            removed = next.len() != notifications.len();
            next
        });
        removed
    }

    fn contains(&self, id: &str) -> bool {
        self.store.get().iter().any(|n| n.id == id)
    }

    /// 定时任务到期
    fn expire(&self, id: &str) {
        let was_pending = self
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if !was_pending {
            return;
        }

        // 已被手动移除的通知不再触发回调
        if !self.remove_entry(id) {
            return;
        }
        debug!("通知已超时移除: {}", id);

        if let Some(callback) = self
            .on_expired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            callback(id);
        }
    }
}

/// 通知队列
#[derive(Clone)]
pub struct NotificationQueue {
    inner: Arc<QueueInner>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_default_timeout(DEFAULT_NOTIFICATION_TIMEOUT_MS)
    }

    /// 指定 add_default 使用的超时时间
    pub fn with_default_timeout(default_timeout_ms: u64) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                store: Writable::new(Vec::new()),
                timers: Mutex::new(HashMap::new()),
                ids: IdGenerator::new(),
                default_timeout_ms,
                on_expired: Mutex::new(None),
            }),
        }
    }

    pub fn default_timeout_ms(&self) -> u64 {
        self.inner.default_timeout_ms
    }

    /// 添加通知，返回其ID
    ///
    /// timeout_ms 为 0 时通知一直保留到手动移除。
    /// 自动移除依赖 tokio 运行时；没有运行时时通知会保留并记录警告。
    pub fn add(&self, severity: Severity, message: impl Into<String>, timeout_ms: u64) -> String {
        let id = self.inner.ids.next();
        let notification = Notification {
            id: id.clone(),
            severity,
            message: message.into(),
            timeout_ms,
        };
        debug!("添加通知 [{}] {}: {}", severity.as_str(), id, notification.message);

        self.inner.store.update(|notifications| {
            let mut next = notifications.clone();
            next.push(notification);
            next
        });

        if timeout_ms > 0 {
            self.schedule_expiry(&id, timeout_ms);
        }

        id
    }

    /// 使用默认超时添加通知
    pub fn add_default(&self, severity: Severity, message: impl Into<String>) -> String {
        self.add(severity, message, self.inner.default_timeout_ms)
    }

    pub fn success(&self, message: impl Into<String>) -> String {
        self.add_default(Severity::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> String {
        self.add_default(Severity::Error, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> String {
        self.add_default(Severity::Warning, message)
    }

    pub fn info(&self, message: impl Into<String>) -> String {
        self.add_default(Severity::Info, message)
    }

    fn schedule_expiry(&self, id: &str, timeout_ms: u64) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("没有 tokio 运行时，通知 {} 不会自动移除", id);
                return;
            }
        };

        let weak: Weak<QueueInner> = Arc::downgrade(&self.inner);
        let task_id = id.to_string();

        // 持锁完成 spawn 和登记，定时任务到期时一定能找到自己的登记
        let mut timers = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // 订阅者可能在 add 的通知回调里已经移除了它
        if !self.inner.contains(id) {
            debug!("通知 {} 已被移除，不再启动定时器", id);
            return;
        }
        let task = runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(&task_id);
            }
        });
        timers.insert(id.to_string(), task.abort_handle());
    }

    /// 移除通知；ID 不存在时内容不变
    pub fn remove(&self, id: &str) {
        if let Some(timer) = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
        {
            timer.abort();
        }
        self.inner.remove_entry(id);
    }

    /// 清空队列并取消所有定时器
    pub fn clear(&self) {
        let timers: Vec<AbortHandle> = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, timer)| timer)
            .collect();
        for timer in timers {
            timer.abort();
        }
        self.inner.store.set(Vec::new());
    }

    pub fn list(&self) -> Vec<Notification> {
        self.inner.store.get()
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 尚未触发的定时器数量
    pub fn pending_timers(&self) -> usize {
        self.inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 设置超时移除回调（用于转发 NotificationExpired 事件）
    pub fn on_expired<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self
            .inner
            .on_expired
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(callback));
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Vec<Notification>) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.store.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_notification_expires_after_timeout() {
        let queue = NotificationQueue::new();
        let id = queue.add(Severity::Info, "hello", 100);

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.list()[0].id, id);
        assert_eq!(queue.pending_timers(), 1);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(queue.len(), 1, "不应提前移除");

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_remove_cancels_timer() {
        let queue = NotificationQueue::new();
        let expired = Arc::new(AtomicUsize::new(0));
        let counter = expired.clone();
        queue.on_expired(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let id = queue.add(Severity::Warning, "x", 50);
        queue.remove(&id);
        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(queue.is_empty());
        assert_eq!(expired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_remove_keeps_other_timers() {
        let queue = NotificationQueue::new();
        let first = queue.add(Severity::Info, "first", 50);
        let second = queue.add(Severity::Info, "second", 80);

        queue.remove(&first);
        assert_eq!(queue.len(), 1);

        tokio::time::sleep(Duration::from_millis(81)).await;
        assert!(queue.is_empty());
        assert!(!queue.list().iter().any(|n| n.id == second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_persists() {
        let queue = NotificationQueue::new();
        let id = queue.add(Severity::Error, "sticky", 0);
        assert_eq!(queue.pending_timers(), 0);

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(queue.len(), 1);

        queue.remove(&id);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_callback_fires_once() {
        let queue = NotificationQueue::new();
        let expired = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        queue.on_expired(move |id| sink.lock().unwrap().push(id.to_string()));

        let id = queue.add(Severity::Success, "saved", 10);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(*expired.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_remove_unknown_id_leaves_queue_unchanged() {
        let queue = NotificationQueue::new();
        queue.add(Severity::Info, "a", 0);
        queue.add(Severity::Warning, "b", 0);
        let before = queue.list();

        queue.remove("nonexistent-id");
        assert_eq!(queue.list(), before);

        let empty = NotificationQueue::new();
        empty.remove("nonexistent-id");
        assert!(empty.is_empty());
    }

    #[test]
    fn test_insertion_order_is_display_order() {
        let queue = NotificationQueue::new();
        queue.add(Severity::Info, "one", 0);
        queue.add(Severity::Error, "two", 0);
        queue.add(Severity::Success, "three", 0);

        let messages: Vec<String> = queue.list().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_rapid_ids_are_unique() {
        let queue = NotificationQueue::new();
        let ids: HashSet<String> = (0..200)
            .map(|i| queue.add(Severity::Info, format!("n{}", i), 0))
            .collect();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn test_without_runtime_notification_is_kept() {
        let queue = NotificationQueue::new();
        queue.add(Severity::Info, "no runtime", 10);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_everything() {
        let queue = NotificationQueue::with_default_timeout(1000);
        queue.info("a");
        queue.warning("b");
        assert_eq!(queue.pending_timers(), 2);
        assert_eq!(queue.list()[0].timeout_ms, 1000);

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);
    }

    #[test]
    fn test_subscribers_see_each_change() {
        let queue = NotificationQueue::new();
        let lengths = Arc::new(Mutex::new(Vec::new()));
        let sink = lengths.clone();
        queue.subscribe(move |notifications| sink.lock().unwrap().push(notifications.len()));

        let id = queue.add(Severity::Info, "a", 0);
        queue.remove(&id);

        assert_eq!(*lengths.lock().unwrap(), vec![0, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_removing_new_notification_leaves_no_timer() {
        let queue = NotificationQueue::new();
        let expired = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        queue.on_expired(move |id| sink.lock().unwrap().push(id.to_string()));

        let remover = queue.clone();
        queue.subscribe(move |notifications| {
            if let Some(n) = notifications.iter().find(|n| n.message == "x") {
                remover.remove(&n.id);
            }
        });

        queue.add(Severity::Info, "x", 50);
        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(queue.is_empty());
        assert!(expired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscriber_adding_during_expiry() {
        let queue = NotificationQueue::new();
        let expired = Arc::new(Mutex::new(Vec::new()));
        let sink = expired.clone();
        queue.on_expired(move |id| sink.lock().unwrap().push(id.to_string()));

        let saw_first = Arc::new(AtomicBool::new(false));
        let added = Arc::new(AtomicBool::new(false));
        let adder = queue.clone();
        queue.subscribe(move |notifications| {
            if notifications.iter().any(|n| n.message == "first") {
                saw_first.store(true, Ordering::SeqCst);
            } else if saw_first.load(Ordering::SeqCst) && !added.swap(true, Ordering::SeqCst) {
                adder.add(Severity::Info, "follow-up", 0);
            }
        });

        let first = queue.add(Severity::Warning, "first", 10);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let messages: Vec<String> = queue.list().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["follow-up"]);
        assert_eq!(queue.pending_timers(), 0);
        assert_eq!(*expired.lock().unwrap(), vec![first]);
    }

    #[test]
    fn test_concurrent_adds_and_removes() {
        let queue = NotificationQueue::new();
        let last_seen = Arc::new(Mutex::new(0));
        let sink = last_seen.clone();
        queue.subscribe(move |notifications| *sink.lock().unwrap() = notifications.len());

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    let mut kept = Vec::new();
                    for i in 0..50 {
                        let id = queue.add(Severity::Info, format!("{}-{}", worker, i), 0);
                        if i % 2 == 0 {
                            queue.remove(&id);
                        } else {
                            kept.push(id);
                        }
                    }
                    kept
                })
            })
            .collect();

        let mut kept = HashSet::new();
        for worker in workers {
            kept.extend(worker.join().unwrap());
        }

        let ids: HashSet<String> = queue.list().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, kept);
        assert_eq!(kept.len(), 4 * 25);
        // 最后一次通知与最终内容一致
        assert_eq!(*last_seen.lock().unwrap(), kept.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_manual_remove_races_expiry() {
        let queue = NotificationQueue::new();
        let expired = Arc::new(AtomicUsize::new(0));
        let counter = expired.clone();
        queue.on_expired(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let ids: Vec<String> = (0..50)
            .map(|i| queue.add(Severity::Info, format!("n{}", i), 5))
            .collect();
        let remover = queue.clone();
        let removed = tokio::task::spawn_blocking(move || {
            for id in ids.iter().step_by(2) {
                remover.remove(id);
            }
        });
        removed.await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(queue.is_empty());
        assert_eq!(queue.pending_timers(), 0);
        // 每条通知只会以一种方式离开队列：没被手动移除的那一半一定超时
        let expired = expired.load(Ordering::SeqCst);
        assert!((25..=50).contains(&expired), "expired = {}", expired);
    }
}
