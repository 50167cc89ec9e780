//! Synchronization utilities for robust lock handling
//!
//! Lock poisoning means a panic happened while a structure was being
//! mutated. These helpers turn that into an application error naming the
//! structure, instead of propagating the panic with `unwrap()`.

use std::sync::{LockResult, MutexGuard, RwLockReadGuard, RwLockWriteGuard};

fn poison_message(kind: &str, what: &str, detail: impl std::fmt::Debug) -> String {
    format!(
        "Internal synchronisation error ({} poisoned while guarding {}). \
         A panic occurred while holding the lock. PoisonError: {:?}",
        kind, what, detail
    )
}

/// Convert a poisoned mutex into an application error
///
/// # Examples
/// ```
/// use std::sync::Mutex;
/// use exec_queue::core::sync::handle_mutex_poison;
/// use exec_queue::queue::QueueError;
///
/// let mutex = Mutex::new(42);
/// let guard = handle_mutex_poison(mutex.lock(), "answer", |message| {
///     QueueError::Internal { message }
/// })
/// .unwrap();
/// assert_eq!(*guard, 42);
/// ```
pub fn handle_mutex_poison<'a, T, E>(
    result: LockResult<MutexGuard<'a, T>>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    result.map_err(|poison_err| error_constructor(poison_message("mutex", what, poison_err)))
}

/// Convert a poisoned RwLock read into an application error
pub fn handle_rwlock_read<'a, T, E>(
    result: LockResult<RwLockReadGuard<'a, T>>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockReadGuard<'a, T>, E> {
    result.map_err(|poison_err| error_constructor(poison_message("RwLock read", what, poison_err)))
}

/// Convert a poisoned RwLock write into an application error
pub fn handle_rwlock_write<'a, T, E>(
    result: LockResult<RwLockWriteGuard<'a, T>>,
    what: &str,
    error_constructor: impl FnOnce(String) -> E,
) -> Result<RwLockWriteGuard<'a, T>, E> {
    result.map_err(|poison_err| {
        error_constructor(poison_message("RwLock write", what, poison_err))
    })
}
