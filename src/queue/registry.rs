//! QueueRegistry - process-wide table of execution queues
//!
//! The registry owns every queue it starts and hands out typed ids. All
//! producer-facing operations resolve an id through the registry, so a
//! destroyed queue is reported as `NotFound` instead of being touched.
//! The table has its own lock; per-queue locks are never taken while it is
//! held, so starting or destroying one queue does not block another.

use crate::core::sync::{handle_rwlock_read, handle_rwlock_write};
use crate::queue::consumer::TaskExecutor;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::execution::{ExecutionQueue, ManagedQueue};
use crate::queue::handle::{QueueId, TaskHandle};
use crate::queue::types::{CancelOutcome, QueueOptions, QueueStats, RunState, TaskPriority};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::runtime::Handle;

type QueueTable = HashMap<u64, Arc<dyn ManagedQueue>>;

/// Owner of all execution queues in a process
///
/// Create one at start-up, share it (usually behind an `Arc`) with every
/// producer, and call [`shutdown`](Self::shutdown) before exiting.
///
/// # Example
///
/// ```rust,no_run
/// use exec_queue::queue::{ExecuteResult, QueueOptions, QueueRegistry, TaskIterator, TaskPriority};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = QueueRegistry::from_current_runtime()?;
///
/// let id = registry.start(
///     |tasks: &mut TaskIterator<u32>| -> ExecuteResult {
///         for task in tasks {
///             println!("task {}", task);
///         }
///         Ok(())
///     },
///     QueueOptions::named("numbers"),
/// )?;
///
/// registry.enqueue(id, 1, TaskPriority::Normal)?;
/// registry.enqueue(id, 2, TaskPriority::Urgent)?;
///
/// registry.stop(id)?;
/// registry.join(id).await?;
/// registry.destroy(id)?;
/// # Ok(())
/// # }
/// ```
pub struct QueueRegistry {
    runtime: Handle,
    next_queue_id: AtomicU64,
    queues: RwLock<QueueTable>,
}

impl QueueRegistry {
    /// Create a registry whose consumers run on `runtime`'s blocking pool
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_queue_id: AtomicU64::new(1),
            queues: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry bound to the runtime of the calling context
    pub fn from_current_runtime() -> QueueResult<Self> {
        let runtime = Handle::try_current().map_err(|e| QueueError::Internal {
            message: format!("no tokio runtime available for queue consumers: {}", e),
        })?;
        Ok(Self::new(runtime))
    }

    /// Start a new queue bound to `executor`
    pub fn start<T, E>(&self, executor: E, options: QueueOptions) -> QueueResult<QueueId<T>>
    where
        T: Send + 'static,
        E: TaskExecutor<T>,
    {
        options.validate()?;

        let id = QueueId::new(self.next_queue_id.fetch_add(1, Ordering::SeqCst));
        let queue = Arc::new(ExecutionQueue::new(
            id,
            options,
            Box::new(executor),
            self.runtime.clone(),
        ));

        let name = queue.name().to_string();
        self.write_table()?.insert(id.value(), queue);
        log::info!("Queue {} ({}) started", id, name);
        Ok(id)
    }

    /// Resolve an id to its queue
    pub fn lookup<T: Send + 'static>(&self, id: QueueId<T>) -> QueueResult<Arc<ExecutionQueue<T>>> {
        self.managed(id.value())?
            .into_any()
            .downcast::<ExecutionQueue<T>>()
            .map_err(|_| QueueError::Internal {
                message: format!("queue {} holds a different payload type", id),
            })
    }

    /// Submit a task to the queue behind `id`
    pub fn enqueue<T: Send + 'static>(
        &self,
        id: QueueId<T>,
        payload: T,
        priority: TaskPriority,
    ) -> QueueResult<TaskHandle> {
        self.lookup(id)?.enqueue(payload, priority)
    }

    /// Cancel a task; never fails, a vanished queue reports `Stale`
    pub fn cancel(&self, handle: TaskHandle) -> CancelOutcome {
        match self.managed(handle.queue_id()) {
            Ok(queue) => queue.cancel_task(handle),
            Err(_) => CancelOutcome::Stale,
        }
    }

    pub fn stop<T>(&self, id: QueueId<T>) -> QueueResult<()> {
        self.managed(id.value())?.request_stop()
    }

    /// Wait until the queue behind `id` has delivered its terminal call
    ///
    /// Only the queue's run-state channel is awaited; no lock is held while
    /// waiting.
    pub async fn join<T>(&self, id: QueueId<T>) -> QueueResult<()> {
        let mut run_state = self.managed(id.value())?.subscribe_run_state();
        let result = run_state
            .wait_for(|state| *state == RunState::Stopped)
            .await
            .map(|_| ());
        result.map_err(|_| QueueError::NotFound {
            queue_id: id.value(),
        })
    }

    /// Remove a stopped queue from the table
    pub fn destroy<T>(&self, id: QueueId<T>) -> QueueResult<()> {
        let mut table = self.write_table()?;
        let queue = table.get(&id.value()).ok_or(QueueError::NotFound {
            queue_id: id.value(),
        })?;

        let state = queue.current_state();
        if state != RunState::Stopped {
            return Err(QueueError::NotStopped {
                queue_id: id.value(),
                state: state.to_string(),
            });
        }

        if let Some(queue) = table.remove(&id.value()) {
            log::debug!("Queue {} ({}) destroyed", id, queue.queue_name());
        }
        Ok(())
    }

    pub fn stats<T>(&self, id: QueueId<T>) -> QueueResult<QueueStats> {
        self.managed(id.value())?.snapshot()
    }

    pub fn queue_count(&self) -> QueueResult<usize> {
        Ok(self.read_table()?.len())
    }

    /// Raw ids of all registered queues, ascending
    pub fn queue_ids(&self) -> QueueResult<Vec<u64>> {
        let mut ids: Vec<u64> = self.read_table()?.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Stop, join and destroy every registered queue
    ///
    /// Returns the number of queues removed from the table.
    pub async fn shutdown(&self) -> QueueResult<usize> {
        let queues: Vec<(u64, Arc<dyn ManagedQueue>)> = self
            .read_table()?
            .iter()
            .map(|(id, queue)| (*id, Arc::clone(queue)))
            .collect();

        if queues.is_empty() {
            return Ok(0);
        }
        log::info!("Shutting down {} execution queue(s)", queues.len());

        for (id, queue) in &queues {
            if let Err(e) = Arc::clone(queue).request_stop() {
                log::warn!("Queue {} could not be stopped: {}", id, e);
            }
        }

        let waits = queues.iter().map(|(id, queue)| {
            let id = *id;
            let mut run_state = queue.subscribe_run_state();
            async move {
                let stopped = run_state
                    .wait_for(|state| *state == RunState::Stopped)
                    .await
                    .is_ok();
                (id, stopped)
            }
        });
        let joined = join_all(waits).await;

        let mut table = self.write_table()?;
        let mut removed = 0;
        for (id, stopped) in joined {
            if stopped && table.remove(&id).is_some() {
                removed += 1;
            }
        }
        log::info!("Execution queues shut down ({} removed)", removed);
        Ok(removed)
    }

    fn managed(&self, id: u64) -> QueueResult<Arc<dyn ManagedQueue>> {
        self.read_table()?
            .get(&id)
            .cloned()
            .ok_or(QueueError::NotFound { queue_id: id })
    }

    fn read_table(&self) -> QueueResult<RwLockReadGuard<'_, QueueTable>> {
        handle_rwlock_read(self.queues.read(), "queue registry", |message| {
            QueueError::Internal { message }
        })
    }

    fn write_table(&self) -> QueueResult<RwLockWriteGuard<'_, QueueTable>> {
        handle_rwlock_write(self.queues.write(), "queue registry", |message| {
            QueueError::Internal { message }
        })
    }
}
