/*!
 * Arena Resources
 *
 * Bump arenas drawn from a shared byte budget
 */

use super::traits::Resource;
use crate::core::limits::DEFAULT_ARENA_BUDGET;
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

/// Arena acquisition failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    #[error("Arena of {requested} bytes exceeds budget ({available} bytes available)")]
    BudgetExceeded { requested: usize, available: usize },
}

/// Bump arena owned by a guard
///
/// Everything allocated in it is freed at once when the guard releases.
#[derive(Debug)]
pub struct Arena {
    bump: Bump,
    reserved: usize,
}

impl Arena {
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Bytes reserved from the budget for this arena
    #[inline]
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    pub fn alloc_str(&self, s: &str) -> &mut str {
        self.bump.alloc_str(s)
    }

    pub fn vec<T>(&self) -> BumpVec<'_, T> {
        BumpVec::new_in(&self.bump)
    }
}

/// Arena allocator drawing from this descriptor's own byte budget
///
/// # Example
///
/// ```ignore
/// let arenas = Arc::new(ArenaResource::with_budget(1 << 20));
/// let guard = ScopedGuard::acquire(&arenas, 4096)?;
/// let name = guard.handle()?.alloc_str("scratch");
/// // Budget returned on drop
/// ```
#[derive(Debug)]
pub struct ArenaResource {
    budget: usize,
    in_use: AtomicUsize,
}

impl ArenaResource {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_ARENA_BUDGET)
    }

    pub fn with_budget(budget: usize) -> Self {
        Self {
            budget,
            in_use: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Bytes currently reserved by open arenas
    #[inline]
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    fn reserve(&self, requested: usize) -> Result<(), ArenaError> {
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(requested).filter(|&total| total <= self.budget)
            })
            .map(|_| ())
            .map_err(|used| ArenaError::BudgetExceeded {
                requested,
                available: self.budget.saturating_sub(used),
            })
    }
}

impl Default for ArenaResource {
    fn default() -> Self {
        Self::new()
    }
}

impl Resource for ArenaResource {
    /// Capacity in bytes
    type Params = usize;
    type Handle = Arena;
    type Error = ArenaError;

    fn kind(&self) -> &'static str {
        "arena"
    }

    fn acquire(&self, capacity: usize) -> Result<Arena, ArenaError> {
        self.reserve(capacity)?;
        debug!(capacity, in_use = self.in_use(), "arena reserved");

        Ok(Arena {
            bump: Bump::with_capacity(capacity),
            reserved: capacity,
        })
    }

    fn release(&self, arena: Arena) -> Result<(), ArenaError> {
        let allocated = arena.allocated_bytes();
        self.in_use.fetch_sub(arena.reserved, Ordering::AcqRel);
        drop(arena);
        debug!(allocated, in_use = self.in_use(), "arena freed");
        Ok(())
    }
}
