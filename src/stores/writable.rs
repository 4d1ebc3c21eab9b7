// 可订阅的状态容器
//
// 每次变更同步通知所有订阅者；订阅时立即以当前值回调一次。
// 写入和通知按 store 串行：同一时刻只有一个线程在派发，其他线程的写入等它派发完毕。
// 回调里可以读取 store，也可以再次写入（重入写入排队，由外层派发按顺序送达）。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

/// 订阅ID，用于取消订阅
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// 派发状态：当前派发线程 + 尚未送达的值
struct Dispatch<T> {
    owner: Option<ThreadId>,
    pending: VecDeque<T>,
}

struct Inner<T> {
    value: RwLock<T>,
    listeners: RwLock<Vec<(SubscriptionId, Listener<T>)>>,
    next_id: AtomicU64,
    dispatch: Mutex<Dispatch<T>>,
    idle: Condvar,
}

/// 持有派发权；释放时唤醒等待写入的线程（回调 panic 时同样释放）
struct DispatchGuard<'a, T> {
    inner: &'a Inner<T>,
}

impl<T> Drop for DispatchGuard<'_, T> {
    fn drop(&mut self) {
        let mut dispatch = self
            .inner
            .dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        dispatch.owner = None;
        dispatch.pending.clear();
        drop(dispatch);
        self.inner.idle.notify_all();
    }
}

/// 可写 store
pub struct Writable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Writable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Writable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                dispatch: Mutex::new(Dispatch {
                    owner: None,
                    pending: VecDeque::new(),
                }),
                idle: Condvar::new(),
            }),
        }
    }

    /// 读取当前值
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 替换当前值并通知订阅者
    pub fn set(&self, value: T) {
        self.write(move |_| value);
    }

    /// 基于当前值计算新值（在写锁内完成），然后通知订阅者
    pub fn update<F>(&self, f: F) -> T
    where
        F: FnOnce(&T) -> T,
    {
        self.write(f)
    }

    /// 订阅变更，立即以当前值回调一次
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let ownership = self.acquire();

        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let listener: Listener<T> = Arc::new(listener);
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::clone(&listener)));

        let current = self.get();
        listener(&current);

        if ownership.is_some() {
            self.drain();
        }
        id
    }

    /// 取消订阅，返回是否存在该订阅
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, Dispatch<T>> {
        self.inner
            .dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 取得派发权；本线程已经在派发（回调里重入）时返回 None
    fn acquire(&self) -> Option<DispatchGuard<'_, T>> {
        let me = thread::current().id();
        let mut dispatch = self.lock_dispatch();
        if dispatch.owner == Some(me) {
            return None;
        }
        while dispatch.owner.is_some() {
            dispatch = self
                .inner
                .idle
                .wait(dispatch)
                .unwrap_or_else(PoisonError::into_inner);
        }
        dispatch.owner = Some(me);
        Some(DispatchGuard { inner: &self.inner })
    }

    /// 只有派发线程会写入，写入顺序即送达顺序
    fn write<F>(&self, f: F) -> T
    where
        F: FnOnce(&T) -> T,
    {
        let ownership = self.acquire();

        let next = {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let next = f(&guard);
            *guard = next.clone();
            next
        };
        self.lock_dispatch().pending.push_back(next.clone());

        if ownership.is_some() {
            self.drain();
        }
        next
    }

    /// 按顺序把排队的值送达所有订阅者
    fn drain(&self) {
        loop {
            let next = self.lock_dispatch().pending.pop_front();
            let Some(value) = next else {
                break;
            };

            // 先复制监听器列表，回调里订阅/取消订阅不会死锁
            let listeners: Vec<Listener<T>> = self
                .inner
                .listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();

            for listener in listeners {
                listener(&value);
            }
        }
    }
}
