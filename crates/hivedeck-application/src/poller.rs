//! Per-task polling loop.
//!
//! Each submitted task gets its own poller: a spawned loop that fetches the
//! task snapshot once per period until the backend reports a terminal status,
//! then delivers exactly one `TaskOutcome` over a oneshot channel. A failed
//! fetch is a skipped tick; the loop keeps going until it sees a terminal
//! snapshot or is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use hivedeck_core::TaskService;
use hivedeck_core::task::{TaskId, TaskOutcome};

/// Handle to a running poll loop.
///
/// Cancelling (or dropping) the handle stops the loop; no outcome is
/// delivered after cancellation.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stops the poll loop. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels and waits for the loop to wind down.
    pub async fn stopped(mut self) {
        self.cancel.cancel();
        let _ = (&mut self.task).await;
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        // A discarded handle must not leave a timer running.
        self.cancel.cancel();
    }
}

/// Spawns the poll loop for a freshly submitted task.
///
/// The first fetch happens one full period after the call, matching the
/// cadence of a backend that needs a moment before the task is queryable.
/// The returned receiver yields at most one outcome and closes without a
/// value when the poller is cancelled first.
pub fn spawn(
    service: Arc<dyn TaskService>,
    task_id: TaskId,
    period: Duration,
) -> (PollerHandle, oneshot::Receiver<TaskOutcome>) {
    let cancel = CancellationToken::new();
    let (outcome_tx, outcome_rx) = oneshot::channel();

    let loop_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        let outcome = loop {
            tokio::select! {
                _ = loop_cancel.cancelled() => return,
                _ = tokio::time::sleep(period) => {}
            }

            let snapshot = tokio::select! {
                _ = loop_cancel.cancelled() => return,
                fetched = service.fetch_task(&task_id) => match fetched {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        // Transient; the next tick retries.
                        tracing::debug!(target: "poller", "Poll for task {} failed: {}", task_id, e);
                        continue;
                    }
                },
            };

            if snapshot.status.is_terminal() {
                break TaskOutcome::from_snapshot(snapshot);
            }
            tracing::debug!(target: "poller", "Task {} still {:?}", task_id, snapshot.status);
        };

        tracing::info!(target: "poller", "Task {} reached {:?}", outcome.task_id, outcome.status);
        // The receiver may already be gone; nothing to do about it here.
        let _ = outcome_tx.send(outcome);
    });

    (PollerHandle { cancel, task }, outcome_rx)
}
