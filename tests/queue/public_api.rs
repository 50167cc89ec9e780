//! Queue lifecycle through the public API

use crate::common::{delivered, logging_executor, stop_and_join, terminal_calls};
use exec_queue::queue::{CancelOutcome, QueueError, QueueOptions, QueueRegistry, RunState, TaskPriority};

#[tokio::test]
async fn test_full_lifecycle() {
    let registry = QueueRegistry::from_current_runtime().unwrap();
    let (log, executor) = logging_executor::<String>();
    let id = registry
        .start(executor, QueueOptions::named("lifecycle"))
        .unwrap();

    for word in ["alpha", "beta", "gamma"] {
        registry
            .enqueue(id, word.to_string(), TaskPriority::Normal)
            .unwrap();
    }
    stop_and_join(&registry, id).await;

    assert_eq!(delivered(&log), vec!["alpha", "beta", "gamma"]);
    assert_eq!(terminal_calls(&log), 1);
    // The terminal call is the last thing the executor sees
    assert!(log.lock().unwrap().last().unwrap().is_none());

    assert_eq!(registry.lookup(id).unwrap().run_state(), RunState::Stopped);
    registry.destroy(id).unwrap();
    assert_eq!(registry.queue_count().unwrap(), 0);
}

#[tokio::test]
async fn test_handles_identify_their_queue() {
    let registry = QueueRegistry::from_current_runtime().unwrap();
    let (_first_log, first_executor) = logging_executor::<u8>();
    let (_second_log, second_executor) = logging_executor::<u8>();
    let first = registry.start(first_executor, QueueOptions::default()).unwrap();
    let second = registry.start(second_executor, QueueOptions::default()).unwrap();

    let a = registry.enqueue(first, 1, TaskPriority::Normal).unwrap();
    let b = registry.enqueue(second, 1, TaskPriority::Normal).unwrap();

    assert_eq!(a.queue_id(), first.value());
    assert_eq!(b.queue_id(), second.value());
    assert_ne!(a, b);

    registry.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_error_kinds_after_stop_and_destroy() {
    let registry = QueueRegistry::from_current_runtime().unwrap();
    let (_log, executor) = logging_executor::<u8>();
    let id = registry.start(executor, QueueOptions::named("errors")).unwrap();

    assert!(matches!(
        registry.destroy(id),
        Err(QueueError::NotStopped { .. })
    ));

    stop_and_join(&registry, id).await;
    assert!(matches!(
        registry.enqueue(id, 1, TaskPriority::Urgent),
        Err(QueueError::AlreadyStopped { .. })
    ));

    registry.destroy(id).unwrap();
    assert!(matches!(
        registry.enqueue(id, 1, TaskPriority::Urgent),
        Err(QueueError::NotFound { .. })
    ));
    assert!(matches!(registry.join(id).await, Err(QueueError::NotFound { .. })));
}

#[tokio::test]
async fn test_cancel_of_unknown_handle_never_fails() {
    let registry = QueueRegistry::from_current_runtime().unwrap();
    let (_log, executor) = logging_executor::<u8>();
    let id = registry.start(executor, QueueOptions::named("cancel")).unwrap();

    let handle = registry.enqueue(id, 1, TaskPriority::Normal).unwrap();
    stop_and_join(&registry, id).await;
    registry.destroy(id).unwrap();

    assert_eq!(registry.cancel(handle), CancelOutcome::Stale);
    assert_eq!(registry.cancel(handle), CancelOutcome::Stale);
}

#[tokio::test]
async fn test_invalid_options_are_rejected() {
    let registry = QueueRegistry::from_current_runtime().unwrap();
    let (_log, executor) = logging_executor::<u8>();

    let error = registry
        .start(executor, QueueOptions::default().with_max_batch_size(0))
        .unwrap_err();

    assert!(matches!(error, QueueError::InvalidArgument { .. }));
}
