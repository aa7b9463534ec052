//! Supervised background tasks
//!
//! Cache write-backs must never block or fail the request caller, but they
//! must not dangle unobserved either. Work spawned here is tracked in a
//! [`JoinSet`]; panicked tasks are logged when reaped, and [`quiesce`]
//! drains everything for tests and graceful shutdown.
//!
//! [`quiesce`]: BackgroundTasks::quiesce

use std::future::Future;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

/// Tracker for fire-and-forget work.
#[derive(Default)]
pub struct BackgroundTasks {
    inner: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `future` as a tracked task.
    ///
    /// Finished tasks are reaped opportunistically, so the set does not
    /// grow with the lifetime of the process.
    pub async fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.inner.lock().await;
        while let Some(reaped) = set.try_join_next() {
            if let Err(e) = reaped {
                warn!("Background task failed: {}", e);
            }
        }
        set.spawn(future);
    }

    /// Number of tasks not yet reaped.
    pub async fn pending(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Wait for every tracked task to finish.
    pub async fn quiesce(&self) {
        let mut set = self.inner.lock().await;
        while let Some(result) = set.join_next().await {
            if let Err(e) = result {
                warn!("Background task failed: {}", e);
            }
        }
    }
}
