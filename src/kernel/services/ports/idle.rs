use std::future::Future;
use std::pin::Pin;

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdleHandle(u64);

impl IdleHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Host facility for running work at the next idle opportunity.
///
/// A cancelled handle must never run its task. Cancelling a handle whose task
/// already started is a no-op: the task runs to completion.
pub trait IdleScheduler: Send + Sync {
    fn schedule(&self, task: BoxFuture) -> IdleHandle;
    fn cancel(&self, handle: IdleHandle);
}
