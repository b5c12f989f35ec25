//! Owned handles for scheduled background work
//!
//! Every timer-like activity in Cadence (prefetch debounce, sleep-timer
//! tick) is held as an explicit `ScheduledTask` value. Replacing or
//! dropping the value aborts the underlying task, so a predecessor is
//! always cancelled before a reschedule and on teardown of the owner.

use std::future::Future;
use tokio::task::JoinHandle;

/// Cancellable handle to a spawned background task
///
/// Aborts the task on drop. Storing one in an `Option` field gives the
/// owner structural cancel-before-reschedule: assigning a replacement
/// drops (and thereby aborts) the previous task.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawn a future as a cancellable task
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Cancel the task
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Whether the task has already run to completion
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn dropping_aborts_the_task() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let task = ScheduledTask::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        });
        drop(task);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn replacement_cancels_predecessor() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let mut slot = Some(ScheduledTask::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
        }));

        // Installing a new task aborts the pending one
        slot = Some(ScheduledTask::spawn(async {}));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!fired.load(Ordering::SeqCst));

        drop(slot);
    }

    #[tokio::test]
    async fn finished_task_reports_completion() {
        let task = ScheduledTask::spawn(async {});
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(task.is_finished());
    }
}
