//! Shared helpers for integration tests

use exec_queue::queue::{ExecuteResult, QueueId, QueueRegistry, TaskIterator};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

/// Everything an executor saw: each batch, plus `None` for the terminal call
pub type Log<T> = Arc<Mutex<Vec<Option<Vec<T>>>>>;

/// Build an executor that appends every invocation to a shared log
pub fn logging_executor<T: Send + 'static>(
) -> (Log<T>, impl Fn(&mut TaskIterator<T>) -> ExecuteResult + Send + Sync + 'static) {
    let log: Log<T> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let executor = move |tasks: &mut TaskIterator<T>| -> ExecuteResult {
        let entry = if tasks.is_queue_stopped() {
            None
        } else {
            Some(tasks.collect())
        };
        sink.lock().unwrap().push(entry);
        Ok(())
    };
    (log, executor)
}

pub fn delivered<T: Clone>(log: &Log<T>) -> Vec<T> {
    log.lock()
        .unwrap()
        .iter()
        .flatten()
        .flat_map(|batch| batch.iter().cloned())
        .collect()
}

pub fn terminal_calls<T>(log: &Log<T>) -> usize {
    log.lock().unwrap().iter().filter(|entry| entry.is_none()).count()
}

pub async fn stop_and_join<T>(registry: &QueueRegistry, id: QueueId<T>) {
    registry.stop(id).unwrap();
    timeout(Duration::from_secs(5), registry.join(id))
        .await
        .expect("join should complete")
        .unwrap();
}
