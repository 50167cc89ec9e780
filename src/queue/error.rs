//! Queue Error Types

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Invalid queue argument: {message}")]
    InvalidArgument { message: String },

    #[error("Queue not found: {queue_id}")]
    NotFound { queue_id: u64 },

    #[error("Queue {queue_id} is stopping or stopped and no longer accepts tasks")]
    AlreadyStopped { queue_id: u64 },

    #[error("Queue {queue_id} has not stopped yet (state: {state})")]
    NotStopped { queue_id: u64, state: String },

    #[error("Queue {queue_id} lost its runtime; pending tasks were discarded")]
    RuntimeUnavailable { queue_id: u64 },

    #[error("Internal queue error: {message}")]
    Internal { message: String },
}

impl QueueError {
    /// True when the id never existed or its queue was destroyed
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueueError::NotFound { .. })
    }
}

impl crate::core::error_handling::ContextualError for QueueError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, QueueError::InvalidArgument { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            QueueError::InvalidArgument { message } => Some(message),
            _ => None,
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
