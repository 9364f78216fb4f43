use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("task failed: {0}")]
    TaskFailed(String),
}

/// Lets synchronous per-item code drive async collaborators.
///
/// Work is spawned onto the runtime behind `handle` and the calling thread
/// blocks until it finishes. Must not be used from a runtime worker thread;
/// run callers under `spawn_blocking` or on a plain thread.
#[derive(Clone)]
pub struct RuntimeBridge {
    handle: Handle,
    timeout: Duration,
}

impl RuntimeBridge {
    pub fn new(handle: Handle, timeout: Duration) -> Self {
        Self { handle, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Submit and wait for completion
    pub fn call<F>(&self, fut: F) -> Result<F::Output, BridgeError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let task = self.handle.spawn(fut);
        self.handle
            .block_on(task)
            .map_err(|e| BridgeError::TaskFailed(e.to_string()))
    }

    /// Submit and wait at most the bridge timeout; the future is dropped on expiry
    pub fn call_with_timeout<F>(&self, fut: F) -> Result<F::Output, BridgeError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        // The timer is created inside the task so callers need no runtime context
        let limit = self.timeout;
        let task = self.handle.spawn(async move { tokio::time::timeout(limit, fut).await });
        match self.handle.block_on(task) {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(_elapsed)) => Err(BridgeError::TimedOut(limit)),
            Err(e) => Err(BridgeError::TaskFailed(e.to_string())),
        }
    }
}
