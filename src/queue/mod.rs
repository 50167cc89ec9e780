//! Execution Queue Component
//!
//! A single-consumer, multi-producer priority task queue. Any number of
//! producers submit tasks to a queue identified by a typed id; exactly one
//! consumer per queue drains it in batches and hands each batch to the
//! queue's executor as a lazy iterator.
//!
//! # Overview
//!
//! - **Multiple Producers**: `enqueue` may be called concurrently from any thread
//! - **Single Consumer**: executor invocations for one queue never overlap
//! - **Urgent Tasks**: urgent tasks overtake normal tasks that are still pending
//! - **Cancellation**: a task can be withdrawn until its batch is detached
//! - **Graceful Stop**: pending tasks drain, then one terminal "stopped" call
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Producer A  │     │  Producer B  │     │  Producer C  │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ enqueue            │ enqueue / cancel   │ enqueue
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     QueueRegistry                       │
//! │  ┌──────────────────────────┐  ┌─────────────────────┐  │
//! │  │ ExecutionQueue #1        │  │ ExecutionQueue #2   │  │
//! │  │ ┌────┬────┬────┬────┐    │  │ ┌────┬────┐         │  │
//! │  │ │ U1 │ U2 │ N1 │ N2 │    │  │ │ N1 │ N2 │         │  │
//! │  │ └────┴────┴────┴────┘    │  │ └────┴────┘         │  │
//! │  │  urgent ▲    normal ▲    │  │                     │  │
//! │  └─────────┼────────────────┘  └──────────┬──────────┘  │
//! └────────────┼──────────────────────────────┼─────────────┘
//!              │ detach batch                 │ detach batch
//!      ┌───────┴────────┐             ┌───────┴────────┐
//!      │ consumer #1    │             │ consumer #2    │  (one per queue,
//!      │ executor(iter) │             │ executor(iter) │   blocking pool)
//!      └────────────────┘             └────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use exec_queue::queue::{ExecuteResult, QueueOptions, QueueRegistry, TaskIterator, TaskPriority};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = QueueRegistry::from_current_runtime()?;
//! let id = registry.start(
//!     |tasks: &mut TaskIterator<String>| -> ExecuteResult {
//!         if tasks.is_queue_stopped() {
//!             return Ok(());
//!         }
//!         for task in tasks {
//!             println!("Processing: {}", task);
//!         }
//!         Ok(())
//!     },
//!     QueueOptions::named("jobs"),
//! )?;
//!
//! let handle = registry.enqueue(id, "index".to_string(), TaskPriority::Normal)?;
//! registry.enqueue(id, "flush".to_string(), TaskPriority::Urgent)?;
//! registry.cancel(handle);
//!
//! registry.stop(id)?;
//! registry.join(id).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
mod consumer;
mod error;
mod execution;
mod handle;
mod internal;
mod registry;
mod types;

pub use consumer::{ExecuteError, ExecuteResult, TaskExecutor, TaskIterator};
pub use error::{QueueError, QueueResult};
pub use execution::ExecutionQueue;
pub use handle::{QueueId, TaskHandle};
pub use registry::QueueRegistry;
pub use types::{CancelOutcome, QueueOptions, QueueStats, RunState, TaskPriority};

#[cfg(test)]
mod tests;
