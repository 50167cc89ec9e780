//! Demonstration of urgent reordering and cancellation
//!
//! Two queues share one executor type. The first receives a mix of normal
//! and urgent tasks back to back; the second receives two normal tasks,
//! waits long enough for them to be handed over, then receives urgent tasks
//! and withdraws the last one.

use crate::queue::{
    CancelOutcome, ExecuteResult, QueueId, QueueOptions, QueueRegistry, QueueResult, QueueStats,
    TaskExecutor, TaskIterator, TaskPriority,
};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strum_macros::{Display, EnumIter};

/// Which part of the demonstration to run
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumIter, Deserialize, clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// Both queues
    #[default]
    All,
    /// Only the queue with back-to-back urgent tasks
    Urgent,
    /// Only the queue that cancels an urgent task
    Cancel,
}

impl Scenario {
    fn runs_urgent(self) -> bool {
        matches!(self, Scenario::All | Scenario::Urgent)
    }

    fn runs_cancel(self) -> bool {
        matches!(self, Scenario::All | Scenario::Cancel)
    }
}

#[derive(Debug, Clone)]
pub struct DemoSettings {
    pub scenario: Scenario,
    /// Simulated work per task
    pub task_delay: Duration,
    pub max_batch_size: Option<usize>,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            task_delay: Duration::from_millis(10),
            max_batch_size: None,
        }
    }
}

/// What one demo queue did
#[derive(Debug, Clone)]
pub struct QueueReport {
    pub queue_id: u64,
    pub name: String,
    /// Task values in execution order
    pub executed: Vec<u32>,
    /// Outcome of cancelling task 5, if the scenario cancels it
    pub cancel_outcome: Option<CancelOutcome>,
    pub stats: QueueStats,
}

#[derive(Debug, Clone, Default)]
pub struct DemoReport {
    pub queues: Vec<QueueReport>,
}

/// Executor that logs each task and sleeps to simulate work
struct DemoExecutor {
    task_delay: Duration,
    executed: Arc<Mutex<Vec<u32>>>,
}

impl TaskExecutor<u32> for DemoExecutor {
    fn execute(&self, tasks: &mut TaskIterator<u32>) -> ExecuteResult {
        let queue_id = tasks.queue_id();
        log::info!(
            "eq_id[{}] execute on {:?}",
            queue_id,
            std::thread::current().name().unwrap_or("unnamed")
        );
        if tasks.is_queue_stopped() {
            log::debug!("eq_id[{}] queue stopped, releasing executor state", queue_id);
            return Ok(());
        }

        for value in tasks {
            log::info!("eq_id[{}] iter-val: {}", queue_id, value);
            std::thread::sleep(self.task_delay);
            self.executed
                .lock()
                .map_err(|_| "demo executor log poisoned")?
                .push(value);
        }
        Ok(())
    }
}

struct DemoQueue {
    id: QueueId<u32>,
    name: &'static str,
    executed: Arc<Mutex<Vec<u32>>>,
    cancel_outcome: Option<CancelOutcome>,
}

fn start_demo_queue(
    registry: &QueueRegistry,
    settings: &DemoSettings,
    name: &'static str,
) -> QueueResult<DemoQueue> {
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = DemoExecutor {
        task_delay: settings.task_delay,
        executed: Arc::clone(&executed),
    };

    let mut options = QueueOptions::named(name);
    if let Some(limit) = settings.max_batch_size {
        options = options.with_max_batch_size(limit);
    }

    let id = registry.start(executor, options)?;
    Ok(DemoQueue {
        id,
        name,
        executed,
        cancel_outcome: None,
    })
}

/// Normal 1, 2 then urgent 3, 4, 5 with no pause in between
fn feed_urgent_queue(registry: &QueueRegistry, queue: &DemoQueue) -> QueueResult<()> {
    registry.enqueue(queue.id, 1, TaskPriority::Normal)?;
    registry.enqueue(queue.id, 2, TaskPriority::Normal)?;
    registry.enqueue(queue.id, 3, TaskPriority::Urgent)?;
    registry.enqueue(queue.id, 4, TaskPriority::Urgent)?;
    let handle = registry.enqueue(queue.id, 5, TaskPriority::Urgent)?;
    log::debug!(
        "eq_id[{}] kept handle for task #{}",
        queue.id,
        handle.sequence()
    );
    Ok(())
}

/// Normal 1, 2, pause, urgent 3, 4, 5, then cancel 5
///
/// The pause lets 1 and 2 be handed over first, so the urgent tasks run
/// after them.
async fn feed_cancel_queue(
    registry: &QueueRegistry,
    queue: &mut DemoQueue,
    pause: Duration,
) -> QueueResult<()> {
    registry.enqueue(queue.id, 1, TaskPriority::Normal)?;
    registry.enqueue(queue.id, 2, TaskPriority::Normal)?;
    tokio::time::sleep(pause).await;

    registry.enqueue(queue.id, 3, TaskPriority::Urgent)?;
    registry.enqueue(queue.id, 4, TaskPriority::Urgent)?;
    let handle = registry.enqueue(queue.id, 5, TaskPriority::Urgent)?;

    let outcome = registry.cancel(handle);
    log::info!("eq_id[{}] cancel task 5: {}", queue.id, outcome);
    queue.cancel_outcome = Some(outcome);
    Ok(())
}

/// Run the selected scenario, then stop, join and destroy its queues
pub async fn run_demo(registry: &QueueRegistry, settings: &DemoSettings) -> QueueResult<DemoReport> {
    log::info!(
        "Running {} scenario (task delay {:?}, max batch {:?})",
        settings.scenario,
        settings.task_delay,
        settings.max_batch_size
    );

    let mut queues = Vec::new();
    if settings.scenario.runs_urgent() {
        let queue = start_demo_queue(registry, settings, "urgent-demo")?;
        feed_urgent_queue(registry, &queue)?;
        queues.push(queue);
    }
    if settings.scenario.runs_cancel() {
        let mut queue = start_demo_queue(registry, settings, "cancel-demo")?;
        feed_cancel_queue(registry, &mut queue, settings.task_delay).await?;
        queues.push(queue);
    }

    for queue in &queues {
        registry.stop(queue.id)?;
    }

    let mut report = DemoReport::default();
    for queue in queues {
        registry.join(queue.id).await?;
        let stats = registry.stats(queue.id)?;
        registry.destroy(queue.id)?;

        let executed = queue
            .executed
            .lock()
            .map(|values| values.clone())
            .unwrap_or_default();
        log::info!(
            "eq_id[{}] {} executed {:?} in {} batch(es)",
            queue.id,
            queue.name,
            executed,
            stats.batches
        );
        report.queues.push(QueueReport {
            queue_id: queue.id.value(),
            name: queue.name.to_string(),
            executed,
            cancel_outcome: queue.cancel_outcome,
            stats,
        });
    }
    Ok(report)
}
