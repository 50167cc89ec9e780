//! Internal pending list backed by an arena of task nodes
//!
//! This module provides the ordering core of an execution queue:
//! - Nodes live in a slot arena and link to each other by index
//! - Urgent nodes form a prefix of the list, normal nodes follow in FIFO order
//! - Slots carry a generation so released nodes cannot be reached by old handles
//! - Detachment moves payloads out of the list into an in-flight batch
//!
//! The list is not synchronised; the owning queue keeps it behind its mutex.

use crate::queue::types::{CancelOutcome, TaskPriority, TaskState};

/// A single submitted task
#[derive(Debug)]
struct TaskNode<T> {
    sequence: u64,
    payload: Option<T>,
    state: TaskState,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    node: Option<TaskNode<T>>,
}

/// Location of a freshly inserted node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Inserted {
    pub slot: usize,
    pub generation: u64,
    pub sequence: u64,
}

/// A node detached into an in-flight batch, with its payload moved out
#[derive(Debug)]
pub(crate) struct DetachedTask<T> {
    pub slot: usize,
    pub generation: u64,
    pub sequence: u64,
    pub payload: T,
}

/// Priority-ordered pending list of one execution queue
#[derive(Debug)]
pub(crate) struct PendingList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Last node of the urgent prefix, if any
    last_urgent: Option<usize>,
    len: usize,
    next_sequence: u64,
}

impl<T> PendingList<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            last_urgent: None,
            len: 0,
            next_sequence: 1,
        }
    }

    /// Number of pending (linked) nodes
    pub fn len(&self) -> usize {
        self.len
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a payload according to its priority class
    pub fn push(&mut self, payload: T, priority: TaskPriority) -> Inserted {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let (idx, generation) = self.allocate(TaskNode {
            sequence,
            payload: Some(payload),
            state: TaskState::Pending,
            prev: None,
            next: None,
        });

        if priority.is_urgent() {
            match self.last_urgent {
                Some(anchor) => self.link_after(anchor, idx),
                None => self.link_front(idx),
            }
            self.last_urgent = Some(idx);
        } else {
            self.link_back(idx);
        }
        self.len += 1;

        Inserted {
            slot: idx,
            generation,
            sequence,
        }
    }

    /// Withdraw a node that has not been detached yet
    pub fn cancel(&mut self, slot: usize, generation: u64) -> CancelOutcome {
        match self.state_of(slot, generation) {
            Some(TaskState::Pending) => {
                self.unlink(slot);
                self.release(slot, generation);
                CancelOutcome::Cancelled
            }
            Some(TaskState::Delivered) => CancelOutcome::Delivered,
            _ => CancelOutcome::Stale,
        }
    }

    /// Detach up to `limit` nodes from the head of the list
    ///
    /// Detached nodes stay in their slots in the `Delivered` state until
    /// [`release`](Self::release) is called for them.
    pub fn detach(&mut self, limit: Option<usize>) -> Vec<DetachedTask<T>> {
        let count = limit.map_or(self.len, |limit| limit.min(self.len));
        let mut batch = Vec::with_capacity(count);

        while batch.len() < count {
            let Some(idx) = self.head else { break };
            self.unlink(idx);

            let generation = self.slots[idx].generation;
            if let Some(node) = self.slots[idx].node.as_mut() {
                node.state = TaskState::Delivered;
                if let Some(payload) = node.payload.take() {
                    batch.push(DetachedTask {
                        slot: idx,
                        generation,
                        sequence: node.sequence,
                        payload,
                    });
                }
            }
        }

        batch
    }

    /// Free a slot, invalidating every handle that still points at it
    pub fn release(&mut self, slot: usize, generation: u64) {
        if let Some(entry) = self.slots.get_mut(slot) {
            if entry.generation == generation && entry.node.take().is_some() {
                entry.generation += 1;
                self.free.push(slot);
            }
        }
    }

    /// State of the node a handle points at, `None` once released
    pub fn state_of(&self, slot: usize, generation: u64) -> Option<TaskState> {
        self.slots
            .get(slot)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.node.as_ref())
            .map(|node| node.state)
    }

    /// Pending sequences in delivery order
    #[cfg(test)]
    pub fn sequences(&self) -> Vec<u64> {
        let mut sequences = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            match self.slots[idx].node.as_ref() {
                Some(node) => {
                    sequences.push(node.sequence);
                    cursor = node.next;
                }
                None => break,
            }
        }
        sequences
    }

    fn allocate(&mut self, node: TaskNode<T>) -> (usize, u64) {
        match self.free.pop() {
            Some(idx) => {
                let entry = &mut self.slots[idx];
                entry.node = Some(node);
                (idx, entry.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                (self.slots.len() - 1, 0)
            }
        }
    }

    fn set_links(&mut self, idx: usize, prev: Option<usize>, next: Option<usize>) {
        if let Some(node) = self.slots[idx].node.as_mut() {
            node.prev = prev;
            node.next = next;
        }
    }

    fn set_prev(&mut self, idx: usize, prev: Option<usize>) {
        if let Some(node) = self.slots[idx].node.as_mut() {
            node.prev = prev;
        }
    }

    fn set_next(&mut self, idx: usize, next: Option<usize>) {
        if let Some(node) = self.slots[idx].node.as_mut() {
            node.next = next;
        }
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        self.set_links(idx, None, old_head);
        match old_head {
            Some(head) => self.set_prev(head, Some(idx)),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn link_back(&mut self, idx: usize) {
        let old_tail = self.tail;
        self.set_links(idx, old_tail, None);
        match old_tail {
            Some(tail) => self.set_next(tail, Some(idx)),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn link_after(&mut self, anchor: usize, idx: usize) {
        let next = self.slots[anchor].node.as_ref().and_then(|node| node.next);
        self.set_links(idx, Some(anchor), next);
        self.set_next(anchor, Some(idx));
        match next {
            Some(next) => self.set_prev(next, Some(idx)),
            None => self.tail = Some(idx),
        }
    }

    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.slots[idx]
            .node
            .as_ref()
            .map(|node| (node.prev, node.next))
        else {
            return;
        };

        match prev {
            Some(prev) => self.set_next(prev, next),
            None => self.head = next,
        }
        match next {
            Some(next) => self.set_prev(next, prev),
            None => self.tail = prev,
        }
        // Urgent nodes form a prefix, so the predecessor is urgent or absent
        if self.last_urgent == Some(idx) {
            self.last_urgent = prev;
        }
        self.set_links(idx, None, None);
        self.len -= 1;
    }
}
