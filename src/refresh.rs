// src/refresh.rs

//! Periodic background ticks tied to a cancellation token.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A spawned timer that calls `on_tick` every `period` until it is
/// cancelled, shut down, or dropped.
///
/// The task runs on a child of the parent token, so cancelling the parent
/// stops every refresh task spawned from it.
#[derive(Debug)]
pub struct RefreshTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// Spawn onto the current tokio runtime. The first tick fires
    /// immediately.
    pub fn spawn<F>(period: Duration, parent: &CancellationToken, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = parent.child_token();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => on_tick(),
                }
            }
            debug!("refresh task stopped");
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
