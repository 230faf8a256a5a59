/*!
 * Scope-Bound Resource Guards
 *
 * Guards that release a resource exactly once, and scopes that release
 * every guard of an extent in reverse acquisition order.
 *
 * ## Design Principles
 *
 * 1. **Exactly once**: Open -> Closed is a one-way edge; close is idempotent
 * 2. **No guard without a handle**: failed acquisition yields only an error
 * 3. **LIFO unwind**: scopes release newest-first on every exit path
 * 4. **Nothing swallowed**: release failures are collected, never dropped
 * 5. **Single owner**: guards move, they are never shared
 *
 * ## Guard Types
 *
 * - **ScopedGuard**: Owns one handle of any [`Resource`]
 * - **Scope**: Stack of guards for one extent
 *
 * ## Resource Descriptors
 *
 * - **FileResource**: Files, synced on release
 * - **LockResource**: Mutex locks, unlocked on release
 * - **ArenaResource**: Bump arenas drawn from a byte budget
 * - **TaskResource**: Tokio tasks, aborted on release
 * - **FnResource**: Any acquire/release closure pair
 *
 * ## Example
 *
 * ```ignore
 * let mut scope = Scope::enter();
 * let src = scope.acquire(&files, FileParams::read("a.txt"))?;
 * let dst = scope.acquire(&files, FileParams::create("b.txt"))?;
 * // If the second open fails, the first file is still released
 * scope.exit()?;
 * ```
 */

mod async_task;
mod fd;
mod lock;
mod memory;
mod resource;
mod scope;
mod scoped;
mod traits;

pub use async_task::{TaskError, TaskFuture, TaskResource};
pub use fd::{FileMode, FileParams, FileResource, OpenFile};
pub use lock::{LockError, LockHandle, LockResource};
pub use memory::{Arena, ArenaError, ArenaResource};
pub use resource::FnResource;
pub use scope::{scoped, scoped_with, GuardKey, Scope};
pub use scoped::ScopedGuard;
pub use traits::{Guard, Resource};

pub use crate::core::errors::{
    AggregateReleaseError, BoxError, GuardError, GuardResult, ScopeResult, ScopedError,
};

use serde::{Deserialize, Serialize};

/// Guard lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    /// Handle held, operations allowed
    Open,
    /// Handle released, operations fail with `UseAfterClose`
    Closed,
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
    /// Times ownership was handed on
    pub transfers: u32,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
            transfers: 0,
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
