//! Public API for the execution queue
//!
//! External modules should import from here rather than directly from
//! internal modules. See the module documentation for usage and architecture.

// Registry and queue instances
pub use crate::queue::execution::ExecutionQueue;
pub use crate::queue::registry::QueueRegistry;

// Executor contract
pub use crate::queue::consumer::{ExecuteError, ExecuteResult, TaskExecutor, TaskIterator};

// Identifiers and handles
pub use crate::queue::handle::{QueueId, TaskHandle};

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Options, states and statistics
pub use crate::queue::types::{CancelOutcome, QueueOptions, QueueStats, RunState, TaskPriority};
