//! Type definitions for the queue system
//!
//! Priority classes, node and queue lifecycle states, start-up options and
//! the statistics snapshot reported by each queue.

use crate::queue::error::{QueueError, QueueResult};
use strum_macros::Display;

/// Priority class of a submitted task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    /// Appended at the tail of the pending list
    #[default]
    Normal,
    /// Placed after the last pending urgent task and before every pending normal task
    Urgent,
}

impl TaskPriority {
    pub fn is_urgent(&self) -> bool {
        matches!(self, TaskPriority::Urgent)
    }
}

/// State of a live task node
///
/// Cancelled and consumed nodes are released from the arena rather than kept
/// in a terminal state; a handle to them reads as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum TaskState {
    /// Linked into the pending list, still cancellable
    Pending,
    /// Detached into an in-flight batch; cancellation no longer applies
    Delivered,
}

/// Run state of a queue instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RunState {
    Active,
    Stopping,
    Stopped,
}

/// What a cancellation request actually did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CancelOutcome {
    /// The task was pending and will never reach the executor
    Cancelled,
    /// The task is already part of a batch handed to the executor
    Delivered,
    /// The task was already released, or its queue no longer exists
    Stale,
}

/// Options supplied when a queue is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    /// Human-readable name used in log lines
    pub name: String,
    /// Upper bound on tasks per executor invocation (`None` = whole pending list)
    pub max_batch_size: Option<usize>,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            name: "execution-queue".to_string(),
            max_batch_size: None,
        }
    }
}

impl QueueOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = Some(max_batch_size);
        self
    }

    pub(crate) fn validate(&self) -> QueueResult<()> {
        if self.name.trim().is_empty() {
            return Err(QueueError::InvalidArgument {
                message: "queue name must not be empty".to_string(),
            });
        }
        if self.max_batch_size == Some(0) {
            return Err(QueueError::InvalidArgument {
                message: "max_batch_size must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Counters for a single queue instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks accepted by `enqueue`
    pub enqueued: u64,
    /// Tasks handed to the executor by its iterator
    pub executed: u64,
    /// Tasks withdrawn before detachment
    pub cancelled: u64,
    /// Detached tasks the executor returned without reading
    pub discarded: u64,
    /// Executor invocations carrying at least one task
    pub batches: u64,
    /// Executor invocations that returned an error or panicked
    pub failed_batches: u64,
    /// Tasks currently waiting in the pending list
    pub pending: usize,
}
