use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;

/// Why a task submitted to the pool produced no output.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// The task ran longer than the pool's per-task timeout and was dropped.
    #[error("task timed out after {0:?}")]
    TimedOut(Duration),
    /// The pool was closed before the task got a slot.
    #[error("task pool is closed")]
    Closed,
}

/// At most `size` tasks run at once, each for at most `task_timeout`.
///
/// Clones share the same slots, so one pool created at startup bounds the
/// whole process.
#[derive(Debug, Clone)]
pub struct TaskPool {
    slots: Arc<Semaphore>,
    size: usize,
    task_timeout: Duration,
}

impl TaskPool {
    /// A pool of `size` slots (at least one).
    pub fn new(size: usize, task_timeout: Duration) -> Self {
        let size = size.max(1);
        TaskPool {
            slots: Arc::new(Semaphore::new(size)),
            size,
            task_timeout,
        }
    }

    /// Number of tasks allowed to run at once.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Per-task timeout.
    pub fn task_timeout(&self) -> Duration {
        self.task_timeout
    }

    /// Wait for a free slot, then drive `task` to completion or timeout.
    /// The timeout starts once the slot is acquired.
    pub async fn run<F>(&self, task: F) -> Result<F::Output, TaskError>
    where
        F: Future,
    {
        let _slot = self.slots.acquire().await.map_err(|_| TaskError::Closed)?;
        tokio::time::timeout(self.task_timeout, task)
            .await
            .map_err(|_| TaskError::TimedOut(self.task_timeout))
    }

    /// Wait for a free slot, then drive `task` to completion with no timeout.
    /// For tasks that bound their own running time.
    pub async fn run_untimed<F>(&self, task: F) -> Result<F::Output, TaskError>
    where
        F: Future,
    {
        let _slot = self.slots.acquire().await.map_err(|_| TaskError::Closed)?;
        Ok(task.await)
    }

    /// Refuse new tasks. Tasks already running are not affected.
    pub fn close(&self) {
        self.slots.close();
    }
}
