//! Shared helpers for the queue test suites

use crate::queue::api::{
    ExecuteResult, QueueId, QueueOptions, QueueRegistry, QueueResult, TaskIterator,
};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

/// One observed executor invocation
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call<T> {
    Batch(Vec<T>),
    Stopped,
}

/// Executor state that records every invocation
///
/// With [`Recorder::hold_first_batch`] the first batch blocks after being
/// recorded until the returned sender fires, which lets a test line up
/// pending work behind an in-flight batch deterministically.
pub(crate) struct Recorder<T> {
    calls: Mutex<Vec<Call<T>>>,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        })
    }

    pub fn hold_first_batch(&self) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn record(&self, tasks: &mut TaskIterator<T>) -> ExecuteResult {
        if tasks.is_queue_stopped() {
            self.calls.lock().unwrap().push(Call::Stopped);
            return Ok(());
        }

        let batch: Vec<T> = tasks.collect();
        self.calls.lock().unwrap().push(Call::Batch(batch));

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv_timeout(Duration::from_secs(5));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<Call<T>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every delivered payload, in delivery order
    pub fn delivered(&self) -> Vec<T> {
        self.calls()
            .into_iter()
            .flat_map(|call| match call {
                Call::Batch(batch) => batch,
                Call::Stopped => Vec::new(),
            })
            .collect()
    }

    pub fn stopped_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Stopped))
            .count()
    }
}

/// Start a queue whose executor feeds `recorder`
pub(crate) fn start_recorded<T: Clone + Send + 'static>(
    registry: &QueueRegistry,
    recorder: &Arc<Recorder<T>>,
    name: &str,
) -> QueueResult<QueueId<T>> {
    let sink = Arc::clone(recorder);
    registry.start(
        move |tasks: &mut TaskIterator<T>| sink.record(tasks),
        QueueOptions::named(name),
    )
}

/// Poll until the recorder has seen at least `count` invocations
pub(crate) async fn wait_for_calls<T: Clone + Send + 'static>(
    recorder: &Recorder<T>,
    count: usize,
) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while recorder.call_count() < count {
        assert!(
            Instant::now() < deadline,
            "Timed out waiting for {} executor calls, saw {}",
            count,
            recorder.call_count()
        );
        sleep(Duration::from_millis(2)).await;
    }
}

/// Stop and join with a bounded wait
pub(crate) async fn stop_and_join<T>(registry: &QueueRegistry, id: QueueId<T>) {
    registry.stop(id).unwrap();
    timeout(Duration::from_secs(5), registry.join(id))
        .await
        .expect("join should complete")
        .unwrap();
}
