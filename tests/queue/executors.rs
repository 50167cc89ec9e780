//! Executor variants and a registry shared between tasks

use crate::common::{delivered, logging_executor, stop_and_join};
use exec_queue::queue::{
    ExecuteResult, QueueOptions, QueueRegistry, TaskExecutor, TaskIterator, TaskPriority,
};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Tally {
    items: AtomicUsize,
    calls: AtomicUsize,
    last_queue: AtomicU64,
}

/// Executor whose state outlives the queue, so the test can inspect it
struct TallyExecutor(Arc<Tally>);

impl TaskExecutor<u64> for TallyExecutor {
    fn execute(&self, tasks: &mut TaskIterator<u64>) -> ExecuteResult {
        let tally = &self.0;
        tally.calls.fetch_add(1, Ordering::SeqCst);
        tally.last_queue.store(tasks.queue_id(), Ordering::SeqCst);
        tally.items.fetch_add(tasks.count(), Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_struct_executor_sees_queue_id() {
    let registry = QueueRegistry::from_current_runtime().unwrap();
    let tally = Arc::new(Tally::default());
    let id = registry
        .start(TallyExecutor(Arc::clone(&tally)), QueueOptions::named("tally"))
        .unwrap();

    for value in 0..20 {
        registry.enqueue(id, value, TaskPriority::Normal).unwrap();
    }
    stop_and_join(&registry, id).await;

    assert_eq!(tally.items.load(Ordering::SeqCst), 20);
    assert_eq!(tally.last_queue.load(Ordering::SeqCst), id.value());
    // At least one batch plus exactly one terminal call
    assert!(tally.calls.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_failing_executor_keeps_consuming() {
    let registry = QueueRegistry::from_current_runtime().unwrap();
    let id = registry
        .start(
            |tasks: &mut TaskIterator<u8>| -> ExecuteResult {
                if tasks.is_queue_stopped() {
                    return Ok(());
                }
                tasks.for_each(drop);
                Err("always fails".into())
            },
            QueueOptions::named("failing"),
        )
        .unwrap();

    for value in 0..5 {
        registry.enqueue(id, value, TaskPriority::Normal).unwrap();
    }
    stop_and_join(&registry, id).await;

    let stats = registry.stats(id).unwrap();
    assert_eq!(stats.executed, 5);
    assert_eq!(stats.failed_batches, stats.batches);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_registry_across_tasks() {
    let registry = Arc::new(QueueRegistry::from_current_runtime().unwrap());
    let (log, executor) = logging_executor::<usize>();
    let id = registry
        .start(executor, QueueOptions::named("shared"))
        .unwrap();

    let producers: Vec<_> = (0..4)
        .map(|producer| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for item in 0..100 {
                    registry
                        .enqueue(id, producer * 100 + item, TaskPriority::Normal)
                        .unwrap();
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }
    stop_and_join(&registry, id).await;

    let mut values = delivered(&log);
    values.sort_unstable();
    assert_eq!(values, (0..400).collect::<Vec<_>>());
}
