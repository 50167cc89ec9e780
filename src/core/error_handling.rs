//! Error reporting shared by the binary and the library
//!
//! Errors that the user can fix (bad arguments, bad configuration) are
//! reported with their own message. Everything else is reported with the
//! operation that failed, and the underlying detail goes to the debug log.

/// Errors that know whether their message is meant for the user
///
/// When `is_user_actionable()` is true, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    fn is_user_actionable(&self) -> bool;

    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error at the detail level its kind calls for
///
/// ```rust,no_run
/// use exec_queue::core::error_handling::log_error_with_context;
/// use exec_queue::queue::QueueError;
///
/// let error = QueueError::InvalidArgument {
///     message: "max_batch_size must be greater than zero".to_string(),
/// };
/// log_error_with_context(&error, "Starting demo queue");
/// // Logs: "FATAL: max_batch_size must be greater than zero"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    log::error!("FATAL: {}", fatal_line(error, operation_context));
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}

fn fatal_line<'a, E: ContextualError + ?Sized>(error: &'a E, operation_context: &'a str) -> &'a str {
    if error.is_user_actionable() {
        error.user_message().unwrap_or(operation_context)
    } else {
        operation_context
    }
}
