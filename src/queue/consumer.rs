//! Consumer-side contract: the executor trait and the batch iterator
//!
//! Each queue has exactly one executor. The consumer loop hands it one
//! [`TaskIterator`] per activation; the iterator yields the payloads of the
//! detached batch in delivery order, or nothing at all when it is the
//! terminal "queue stopped" call.

use std::error::Error;

/// Error type an executor may return from a batch
pub type ExecuteError = Box<dyn Error + Send + Sync + 'static>;

/// Result of a single executor invocation
pub type ExecuteResult = Result<(), ExecuteError>;

/// User code that consumes batches of tasks for one queue
///
/// The executor value is the queue's context: any state it needs travels
/// with it. Invocations for one queue never overlap, so `execute` may use
/// interior state without further coordination beyond `Sync`.
///
/// # Example
///
/// ```rust
/// use exec_queue::queue::{ExecuteResult, TaskExecutor, TaskIterator};
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// struct Summer {
///     total: AtomicU64,
/// }
///
/// impl TaskExecutor<u64> for Summer {
///     fn execute(&self, tasks: &mut TaskIterator<u64>) -> ExecuteResult {
///         if tasks.is_queue_stopped() {
///             return Ok(());
///         }
///         for value in tasks {
///             self.total.fetch_add(value, Ordering::Relaxed);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait TaskExecutor<T>: Send + Sync + 'static {
    fn execute(&self, tasks: &mut TaskIterator<T>) -> ExecuteResult;
}

impl<T, F> TaskExecutor<T> for F
where
    F: Fn(&mut TaskIterator<T>) -> ExecuteResult + Send + Sync + 'static,
{
    fn execute(&self, tasks: &mut TaskIterator<T>) -> ExecuteResult {
        self(tasks)
    }
}

/// Forward-only view over one detached batch
#[derive(Debug)]
pub struct TaskIterator<T> {
    queue_id: u64,
    tasks: std::vec::IntoIter<T>,
    stopped: bool,
    yielded: usize,
}

impl<T> TaskIterator<T> {
    pub(crate) fn batch(queue_id: u64, tasks: Vec<T>) -> Self {
        Self {
            queue_id,
            tasks: tasks.into_iter(),
            stopped: false,
            yielded: 0,
        }
    }

    pub(crate) fn stopped(queue_id: u64) -> Self {
        Self {
            queue_id,
            tasks: Vec::new().into_iter(),
            stopped: true,
            yielded: 0,
        }
    }

    /// True only for the terminal call made after the queue was stopped
    pub fn is_queue_stopped(&self) -> bool {
        self.stopped
    }

    /// Raw id of the queue this batch came from
    pub fn queue_id(&self) -> u64 {
        self.queue_id
    }

    /// Tasks not read yet
    pub fn remaining(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn yielded(&self) -> usize {
        self.yielded
    }
}

impl<T> Iterator for TaskIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let task = self.tasks.next()?;
        self.yielded += 1;
        Some(task)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.tasks.size_hint()
    }
}

impl<T> ExactSizeIterator for TaskIterator<T> {}
