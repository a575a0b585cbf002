//! 空闲调度器
//!
//! - TokioIdleScheduler: 低优先级定时器，延迟后在 tokio 上执行
//! - IdleQueue: 由宿主在空闲时主动拉取执行（事件循环 / 测试）

use crate::kernel::services::ports::{BoxFuture, IdleHandle, IdleScheduler};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::AbortHandle;

static IDLE_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

fn next_idle_handle() -> IdleHandle {
    IdleHandle::new(IDLE_HANDLE_ID.fetch_add(1, Ordering::Relaxed))
}

// 已登记的任务不能因为别处 panic 而丢失
fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct TokioIdleScheduler {
    runtime: tokio::runtime::Handle,
    delay: Duration,
    pending: Arc<Mutex<FxHashMap<u64, AbortHandle>>>,
}

impl TokioIdleScheduler {
    pub fn new(runtime: tokio::runtime::Handle, delay: Duration) -> Self {
        Self {
            runtime,
            delay,
            pending: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    pub fn pending_len(&self) -> usize {
        lock_recover(&self.pending).len()
    }
}

impl IdleScheduler for TokioIdleScheduler {
    fn schedule(&self, task: BoxFuture) -> IdleHandle {
        let handle = next_idle_handle();
        let id = handle.id();
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);

        // 持锁 spawn，保证任务触发时 abort handle 已登记
        let mut map = lock_recover(&self.pending);
        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::task::yield_now().await;
            // 已触发：从此不可取消，跑完为止
            let fired = lock_recover(&pending).remove(&id).is_some();
            if !fired {
                return;
            }
            task.await;
        });
        map.insert(id, join.abort_handle());
        handle
    }

    fn cancel(&self, handle: IdleHandle) {
        let removed = lock_recover(&self.pending).remove(&handle.id());
        if let Some(abort) = removed {
            abort.abort();
        }
    }
}

#[derive(Default)]
pub struct IdleQueue {
    queue: Mutex<VecDeque<(IdleHandle, BoxFuture)>>,
}

impl IdleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops the oldest pending task; the caller drives it to completion.
    pub fn take_next(&self) -> Option<BoxFuture> {
        lock_recover(&self.queue)
            .pop_front()
            .map(|(_, task)| task)
    }

    pub fn len(&self) -> usize {
        lock_recover(&self.queue).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdleScheduler for IdleQueue {
    fn schedule(&self, task: BoxFuture) -> IdleHandle {
        let handle = next_idle_handle();
        lock_recover(&self.queue).push_back((handle, task));
        handle
    }

    fn cancel(&self, handle: IdleHandle) {
        lock_recover(&self.queue).retain(|(h, _)| *h != handle);
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/idle.rs"]
mod tests;
