//! Queue identifiers and task handles
//!
//! Both are plain `Copy` values. Neither owns anything: a `QueueId` resolves
//! through the registry, a `TaskHandle` resolves through its queue's arena,
//! and either simply stops resolving once the referent is gone.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed identifier of a queue started by a [`QueueRegistry`](crate::queue::QueueRegistry)
///
/// The payload type is part of the id so a queue of `u32` cannot be fed a
/// `String`. Ids come from a registry-wide counter and are never reused.
pub struct QueueId<T> {
    value: u64,
    _payload: PhantomData<fn() -> T>,
}

impl<T> QueueId<T> {
    pub(crate) fn new(value: u64) -> Self {
        Self {
            value,
            _payload: PhantomData,
        }
    }

    /// Raw numeric id, as used in log lines and errors
    pub fn value(&self) -> u64 {
        self.value
    }
}

impl<T> Clone for QueueId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for QueueId<T> {}

impl<T> PartialEq for QueueId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for QueueId<T> {}

impl<T> Hash for QueueId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for QueueId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueueId").field(&self.value).finish()
    }
}

impl<T> fmt::Display for QueueId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Caller-held reference to a submitted task, used for cancellation
///
/// `slot` and `generation` address the task's arena slot; once the slot is
/// released its generation moves on and the handle goes stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub(crate) queue: u64,
    pub(crate) slot: usize,
    pub(crate) generation: u64,
    pub(crate) sequence: u64,
}

impl TaskHandle {
    /// Raw id of the queue the task was submitted to
    pub fn queue_id(&self) -> u64 {
        self.queue
    }

    /// Sequence number assigned at enqueue time
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
