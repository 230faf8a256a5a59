/*!
 * Resource Scope Library
 * Scope-bound resource guards with exactly-once, reverse-order release
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::guard::{
    ArenaResource, FileMode, FileParams, FileResource, LockResource, TaskFuture, TaskResource,
};
pub use crate::core::*;
pub use monitoring::init_tracing;
