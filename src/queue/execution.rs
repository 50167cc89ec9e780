//! ExecutionQueue - one priority queue with a single consumer
//!
//! Producers call [`ExecutionQueue::enqueue`] from any thread. The first
//! enqueue into an idle queue schedules a consumer activation on the tokio
//! blocking pool; that activation keeps detaching batches until the pending
//! list is empty, then goes idle again. A `consumer_busy` flag, checked and
//! set under the same mutex as the pending list, guarantees that at most one
//! activation exists per queue.
//!
//! An activation the runtime refuses to run (because it has shut down) is
//! dropped unrun; the queue then discards its pending tasks and moves
//! straight to `Stopped` so that `join` does not wait forever.

use crate::core::sync::handle_mutex_poison;
use crate::queue::consumer::{TaskExecutor, TaskIterator};
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::handle::{QueueId, TaskHandle};
use crate::queue::internal::{DetachedTask, PendingList};
use crate::queue::types::{CancelOutcome, QueueOptions, QueueStats, RunState, TaskPriority};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Mutable state guarded by the queue's structural lock
struct QueueState<T> {
    pending: PendingList<T>,
    run_state: RunState,
    /// Set while an activation is scheduled or running; stays set once stopped
    consumer_busy: bool,
}

#[derive(Debug, Default)]
struct QueueCounters {
    enqueued: AtomicU64,
    executed: AtomicU64,
    cancelled: AtomicU64,
    discarded: AtomicU64,
    batches: AtomicU64,
    failed_batches: AtomicU64,
}

/// What the consumer loop should do next
enum Activation<T> {
    Batch(Vec<DetachedTask<T>>),
    Terminal,
    Idle,
}

/// A scheduled activation
///
/// If the runtime drops it without calling [`run`](Self::run), the queue is
/// abandoned.
struct ConsumerLaunch<T: Send + 'static> {
    queue: Option<Arc<ExecutionQueue<T>>>,
}

impl<T: Send + 'static> ConsumerLaunch<T> {
    fn run(mut self) {
        if let Some(queue) = self.queue.take() {
            queue.run_consumer();
        }
    }
}

impl<T: Send + 'static> Drop for ConsumerLaunch<T> {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.take() {
            queue.abandon();
        }
    }
}

/// A single-consumer, multi-producer priority queue
///
/// Obtained from [`QueueRegistry::start`](crate::queue::QueueRegistry::start)
/// or [`QueueRegistry::lookup`](crate::queue::QueueRegistry::lookup).
pub struct ExecutionQueue<T> {
    id: QueueId<T>,
    options: QueueOptions,
    executor: Box<dyn TaskExecutor<T>>,
    state: Mutex<QueueState<T>>,
    run_state_tx: watch::Sender<RunState>,
    runtime: Handle,
    /// Set once an activation was dropped without running
    runtime_lost: AtomicBool,
    counters: QueueCounters,
}

impl<T: Send + 'static> ExecutionQueue<T> {
    pub(crate) fn new(
        id: QueueId<T>,
        options: QueueOptions,
        executor: Box<dyn TaskExecutor<T>>,
        runtime: Handle,
    ) -> Self {
        let (run_state_tx, _) = watch::channel(RunState::Active);
        Self {
            id,
            options,
            executor,
            state: Mutex::new(QueueState {
                pending: PendingList::new(),
                run_state: RunState::Active,
                consumer_busy: false,
            }),
            run_state_tx,
            runtime,
            runtime_lost: AtomicBool::new(false),
            counters: QueueCounters::default(),
        }
    }

    pub fn id(&self) -> QueueId<T> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn options(&self) -> &QueueOptions {
        &self.options
    }

    pub fn run_state(&self) -> RunState {
        *self.run_state_tx.borrow()
    }

    /// Submit a task; wakes the consumer if it is idle
    pub fn enqueue(self: &Arc<Self>, payload: T, priority: TaskPriority) -> QueueResult<TaskHandle> {
        let (handle, wake_consumer) = {
            let mut state = self.lock_state()?;
            if self.runtime_lost.load(Ordering::Acquire) {
                return Err(QueueError::RuntimeUnavailable {
                    queue_id: self.id.value(),
                });
            }
            if state.run_state != RunState::Active {
                return Err(QueueError::AlreadyStopped {
                    queue_id: self.id.value(),
                });
            }

            let inserted = state.pending.push(payload, priority);
            let wake_consumer = !state.consumer_busy;
            state.consumer_busy = true;

            let handle = TaskHandle {
                queue: self.id.value(),
                slot: inserted.slot,
                generation: inserted.generation,
                sequence: inserted.sequence,
            };
            (handle, wake_consumer)
        };

        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "Queue {} ({}) accepted task #{} [{}]",
            self.id,
            self.options.name,
            handle.sequence,
            priority
        );

        if wake_consumer && !self.schedule_consumer() {
            return Err(QueueError::RuntimeUnavailable {
                queue_id: self.id.value(),
            });
        }
        Ok(handle)
    }

    /// Withdraw a task that has not been handed to the executor yet
    pub fn cancel(&self, handle: TaskHandle) -> CancelOutcome {
        if handle.queue != self.id.value() {
            return CancelOutcome::Stale;
        }

        let outcome = match self.lock_state() {
            Ok(mut state) => state.pending.cancel(handle.slot, handle.generation),
            Err(e) => {
                log::error!("Queue {} cancel failed: {}", self.id, e);
                CancelOutcome::Stale
            }
        };

        if outcome == CancelOutcome::Cancelled {
            self.counters.cancelled.fetch_add(1, Ordering::Relaxed);
        }
        log::debug!(
            "Queue {} ({}) cancel of task #{}: {}",
            self.id,
            self.options.name,
            handle.sequence,
            outcome
        );
        outcome
    }

    /// Request shutdown; pending tasks are still delivered before the terminal call
    pub fn stop(self: &Arc<Self>) -> QueueResult<()> {
        let wake_consumer = {
            let mut state = self.lock_state()?;
            if state.run_state != RunState::Active {
                return Ok(());
            }
            state.run_state = RunState::Stopping;
            self.run_state_tx.send_replace(RunState::Stopping);

            let wake_consumer = !state.consumer_busy;
            state.consumer_busy = true;
            wake_consumer
        };

        log::info!("Queue {} ({}) stopping", self.id, self.options.name);
        if wake_consumer {
            // A lost runtime already left the queue Stopped
            self.schedule_consumer();
        }
        Ok(())
    }

    /// Wait until the terminal call has completed
    pub async fn join(&self) -> QueueResult<()> {
        let mut run_state = self.run_state_tx.subscribe();
        let result = run_state
            .wait_for(|state| *state == RunState::Stopped)
            .await
            .map(|_| ());
        result.map_err(|_| QueueError::NotFound {
            queue_id: self.id.value(),
        })
    }

    pub fn stats(&self) -> QueueResult<QueueStats> {
        let pending = self.lock_state()?.pending.len();
        Ok(QueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            executed: self.counters.executed.load(Ordering::Relaxed),
            cancelled: self.counters.cancelled.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            batches: self.counters.batches.load(Ordering::Relaxed),
            failed_batches: self.counters.failed_batches.load(Ordering::Relaxed),
            pending,
        })
    }

    fn lock_state(&self) -> QueueResult<MutexGuard<'_, QueueState<T>>> {
        handle_mutex_poison(self.state.lock(), "execution queue state", |message| {
            QueueError::Internal { message }
        })
    }

    /// Hand an activation to the blocking pool; false if the runtime refused it
    fn schedule_consumer(self: &Arc<Self>) -> bool {
        let launch = ConsumerLaunch {
            queue: Some(Arc::clone(self)),
        };
        // Detached: completion is observed through the run-state channel
        let _ = self.runtime.spawn_blocking(move || launch.run());
        !self.runtime_lost.load(Ordering::Acquire)
    }

    /// Stop without a consumer: drop every pending task and publish `Stopped`
    fn abandon(&self) {
        self.runtime_lost.store(true, Ordering::Release);
        let dropped = match self.lock_state() {
            Ok(mut state) => {
                state.run_state = RunState::Stopped;
                let batch = state.pending.detach(None);
                for task in &batch {
                    state.pending.release(task.slot, task.generation);
                }
                batch
            }
            Err(e) => {
                log::error!("Queue {} could not discard pending tasks: {}", self.id, e);
                Vec::new()
            }
        };
        self.run_state_tx.send_replace(RunState::Stopped);

        self.counters
            .discarded
            .fetch_add(dropped.len() as u64, Ordering::Relaxed);
        log::error!(
            "Queue {} ({}) runtime is shut down; discarded {} pending task(s)",
            self.id,
            self.options.name,
            dropped.len()
        );
    }

    fn run_consumer(&self) {
        log::debug!("Queue {} ({}) consumer activated", self.id, self.options.name);
        loop {
            let activation = match self.next_activation() {
                Ok(activation) => activation,
                Err(e) => {
                    log::error!("Queue {} consumer aborted: {}", self.id, e);
                    return;
                }
            };

            match activation {
                Activation::Batch(batch) => self.execute_batch(batch),
                Activation::Terminal => {
                    self.execute_terminal();
                    return;
                }
                Activation::Idle => {
                    log::debug!("Queue {} ({}) consumer idle", self.id, self.options.name);
                    return;
                }
            }
        }
    }

    fn next_activation(&self) -> QueueResult<Activation<T>> {
        let mut state = self.lock_state()?;

        let batch = state.pending.detach(self.options.max_batch_size);
        if !batch.is_empty() {
            return Ok(Activation::Batch(batch));
        }

        match state.run_state {
            RunState::Active => {
                state.consumer_busy = false;
                Ok(Activation::Idle)
            }
            RunState::Stopping | RunState::Stopped => Ok(Activation::Terminal),
        }
    }

    fn execute_batch(&self, batch: Vec<DetachedTask<T>>) {
        let mut slots = Vec::with_capacity(batch.len());
        let mut payloads = Vec::with_capacity(batch.len());
        for task in batch {
            slots.push((task.slot, task.generation));
            payloads.push(task.payload);
        }
        log::debug!(
            "Queue {} ({}) delivering batch of {} task(s)",
            self.id,
            self.options.name,
            payloads.len()
        );

        let mut tasks = TaskIterator::batch(self.id.value(), payloads);
        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        self.invoke(&mut tasks);

        let executed = tasks.yielded() as u64;
        let discarded = tasks.remaining() as u64;
        // Unread payloads are dropped here, outside the lock
        drop(tasks);

        self.counters.executed.fetch_add(executed, Ordering::Relaxed);
        if discarded > 0 {
            self.counters.discarded.fetch_add(discarded, Ordering::Relaxed);
            log::warn!(
                "Queue {} ({}) executor left {} task(s) unread; they were discarded",
                self.id,
                self.options.name,
                discarded
            );
        }

        match self.lock_state() {
            Ok(mut state) => {
                for (slot, generation) in slots {
                    state.pending.release(slot, generation);
                }
            }
            Err(e) => log::error!("Queue {} could not release batch: {}", self.id, e),
        }
    }

    fn execute_terminal(&self) {
        let mut tasks = TaskIterator::stopped(self.id.value());
        self.invoke(&mut tasks);

        match self.lock_state() {
            Ok(mut state) => {
                state.run_state = RunState::Stopped;
                self.run_state_tx.send_replace(RunState::Stopped);
            }
            Err(e) => {
                log::error!("Queue {} could not record stop: {}", self.id, e);
                self.run_state_tx.send_replace(RunState::Stopped);
            }
        }
        log::info!("Queue {} ({}) stopped", self.id, self.options.name);
    }

    /// Run the executor, containing errors and panics so bookkeeping continues
    fn invoke(&self, tasks: &mut TaskIterator<T>) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.executor.execute(tasks)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.counters.failed_batches.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "Queue {} ({}) executor returned an error: {}",
                    self.id,
                    self.options.name,
                    e
                );
            }
            Err(panic_payload) => {
                self.counters.failed_batches.fetch_add(1, Ordering::Relaxed);
                log::error!(
                    "Queue {} ({}) executor panicked: {}",
                    self.id,
                    self.options.name,
                    panic_message(panic_payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Type-erased view the registry keeps of every queue
pub(crate) trait ManagedQueue: Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn queue_name(&self) -> &str;
    fn current_state(&self) -> RunState;
    fn request_stop(self: Arc<Self>) -> QueueResult<()>;
    fn cancel_task(&self, handle: TaskHandle) -> CancelOutcome;
    fn subscribe_run_state(&self) -> watch::Receiver<RunState>;
    fn snapshot(&self) -> QueueResult<QueueStats>;
}

impl<T: Send + 'static> ManagedQueue for ExecutionQueue<T> {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn queue_name(&self) -> &str {
        self.name()
    }

    fn current_state(&self) -> RunState {
        self.run_state()
    }

    fn request_stop(self: Arc<Self>) -> QueueResult<()> {
        self.stop()
    }

    fn cancel_task(&self, handle: TaskHandle) -> CancelOutcome {
        self.cancel(handle)
    }

    fn subscribe_run_state(&self) -> watch::Receiver<RunState> {
        self.run_state_tx.subscribe()
    }

    fn snapshot(&self) -> QueueResult<QueueStats> {
        self.stats()
    }
}
