//! Cancellable one-shot scheduled tasks on the Tokio timer.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Handle to a task scheduled with [`schedule`].
///
/// Dropping the handle does not cancel the task; call [`ScheduledTask::cancel`].
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
    fire_at: Instant,
}

/// Run `task` once after `delay`.
pub fn schedule<F>(delay: Duration, task: F) -> ScheduledTask
where
    F: Future<Output = ()> + Send + 'static,
{
    let fire_at = Instant::now() + delay;
    let handle = tokio::spawn(async move {
        tokio::time::sleep_until(fire_at).await;
        task.await;
    });
    ScheduledTask { handle, fire_at }
}

impl ScheduledTask {
    /// Abort the task if it has not run yet. Idempotent.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn fire_at(&self) -> Instant {
        self.fire_at
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
