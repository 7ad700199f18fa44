//! Pre-attach workspace refresh ("auto-reload").
//!
//! When auto-reload is enabled, the workspace is refreshed before the
//! session attaches so the runtime sees the saved state of every file.
//! The refresh collaborator signals completion asynchronously and may do
//! so more than once; the gate tolerates duplicates and bounds the wait
//! so a refresh that never completes cannot block the attach forever.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use replaunch_shared::{LaunchError, LaunchResult};
use tokio::sync::watch;

/// Workspace refresh collaborator ("touch project").
#[async_trait]
pub trait WorkspaceRefresher: Send + Sync {
    /// Refresh the workspace; resolves when the refresh has completed.
    async fn refresh(&self) -> LaunchResult<()>;
}

/// Refresher that does nothing. Used when no workspace is involved.
pub struct NoopRefresher;

#[async_trait]
impl WorkspaceRefresher for NoopRefresher {
    async fn refresh(&self) -> LaunchResult<()> {
        Ok(())
    }
}

/// Completion signal that tolerates being completed more than once.
///
/// Refresh callbacks can fire multiple times for a single logical
/// refresh; only the first completion matters.
pub struct CompletionLatch {
    tx: watch::Sender<bool>,
}

/// Waiting side of a [`CompletionLatch`].
pub struct LatchWaiter {
    rx: watch::Receiver<bool>,
}

impl CompletionLatch {
    pub fn new() -> (CompletionLatch, LatchWaiter) {
        let (tx, rx) = watch::channel(false);
        (CompletionLatch { tx }, LatchWaiter { rx })
    }

    /// Mark the latch complete. Safe to call repeatedly.
    pub fn complete(&self) {
        self.tx.send_replace(true);
    }
}

impl LatchWaiter {
    /// Wait until the latch has been completed at least once.
    pub async fn wait(&mut self) {
        // The sender being dropped counts as completion: the refresh
        // task is gone either way.
        let _ = self.rx.wait_for(|done| *done).await;
    }
}

/// How a refresh gate run resolved.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Auto-reload disabled; nothing was refreshed.
    Skipped,
    /// Refresh completed before the bound.
    Completed,
    /// Refresh errored; the attach proceeds anyway.
    Failed(LaunchError),
    /// Refresh did not signal completion within the bound.
    TimedOut,
}

/// Bounded wait for the pre-attach refresh.
pub struct RefreshGate {
    bound: Duration,
}

impl RefreshGate {
    pub fn new(bound: Duration) -> Self {
        Self { bound }
    }

    /// Run the refresh and wait for its completion, up to the bound.
    ///
    /// The attach must never begin before this returns, and this always
    /// returns: disabled gates resolve immediately, and a refresh that
    /// never signals completion resolves as [`RefreshOutcome::TimedOut`]
    /// once the bound elapses.
    pub async fn run(
        &self,
        refresher: Arc<dyn WorkspaceRefresher>,
        enabled: bool,
    ) -> RefreshOutcome {
        if !enabled {
            return RefreshOutcome::Skipped;
        }

        let (latch, mut waiter) = CompletionLatch::new();
        let failure: Arc<Mutex<Option<LaunchError>>> = Arc::new(Mutex::new(None));

        let task_failure = failure.clone();
        tokio::spawn(async move {
            if let Err(e) = refresher.refresh().await {
                if let Ok(mut slot) = task_failure.lock() {
                    *slot = Some(e);
                }
            }
            latch.complete();
        });

        if tokio::time::timeout(self.bound, waiter.wait()).await.is_err() {
            tracing::warn!(
                bound_ms = self.bound.as_millis() as u64,
                "workspace refresh did not complete in time, attaching anyway"
            );
            return RefreshOutcome::TimedOut;
        }

        match failure.lock().ok().and_then(|mut slot| slot.take()) {
            Some(e) => RefreshOutcome::Failed(e),
            None => RefreshOutcome::Completed,
        }
    }
}
