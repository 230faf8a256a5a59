/*!
 * Lock Resources
 *
 * Mutex acquisition with unlock-on-release
 */

use super::traits::Resource;
use crate::core::limits::DEFAULT_LOCK_TIMEOUT;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Lock acquisition failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("Lock not acquired within {waited:?}")]
    Timeout { waited: Duration },
}

/// Held lock; derefs to the protected data
pub type LockHandle<T> = ArcMutexGuard<RawMutex, T>;

/// Mutex whose lock is a scoped resource
///
/// The mutex does the blocking; the guard only guarantees that the unlock
/// happens exactly once however the critical section exits.
///
/// # Example
///
/// ```ignore
/// let counter = Arc::new(LockResource::new(0u64));
/// let mut guard = ScopedGuard::acquire(&counter, ())?;
/// guard.with(|value| **value += 1)?;
/// // Unlocked on drop, early return or close
/// ```
pub struct LockResource<T> {
    mutex: Arc<Mutex<T>>,
    timeout: Option<Duration>,
}

impl<T: Send> LockResource<T> {
    /// Lock that waits at most the default timeout
    pub fn new(data: T) -> Self {
        Self::from_mutex(Arc::new(Mutex::new(data)))
    }

    /// Share an existing mutex
    pub fn from_mutex(mutex: Arc<Mutex<T>>) -> Self {
        Self {
            mutex,
            timeout: Some(DEFAULT_LOCK_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Block until the lock is free
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn mutex(&self) -> &Arc<Mutex<T>> {
        &self.mutex
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.mutex.is_locked()
    }
}

impl<T: Send + 'static> Resource for LockResource<T> {
    type Params = ();
    type Handle = LockHandle<T>;
    type Error = LockError;

    fn kind(&self) -> &'static str {
        "lock"
    }

    fn acquire(&self, _params: ()) -> Result<LockHandle<T>, LockError> {
        match self.timeout {
            Some(waited) => {
                Mutex::try_lock_arc_for(&self.mutex, waited).ok_or(LockError::Timeout { waited })
            }
            None => Ok(Mutex::lock_arc(&self.mutex)),
        }
    }

    fn release(&self, handle: LockHandle<T>) -> Result<(), LockError> {
        drop(handle);
        Ok(())
    }
}
