/*!
 * Guard Traits
 *
 * Core abstractions for scope-bound resource guards
 */

use super::{GuardMetadata, GuardState};
use crate::core::errors::{BoxError, GuardResult};
use std::any::Any;

/// Resource descriptor: the acquire/release pair for one kind of resource
///
/// A descriptor is supplied once per resource kind and shared by every guard
/// of that kind. Back-end errors are returned unchanged; the guard layer
/// wraps them into [`crate::GuardError`] with the descriptor's `kind`.
pub trait Resource: Send + Sync {
    /// Arguments needed to open one instance
    type Params;

    /// Live handle owned by a guard while it is open
    type Handle: Send;

    /// Back-end failure for acquire or release
    type Error: Into<BoxError>;

    /// Resource type name for logging/debugging
    fn kind(&self) -> &'static str;

    /// Open one instance
    fn acquire(&self, params: Self::Params) -> Result<Self::Handle, Self::Error>;

    /// Give the handle back to the back-end
    ///
    /// Called at most once per successfully acquired handle.
    fn release(&self, handle: Self::Handle) -> Result<(), Self::Error>;
}

/// Object-safe view of a guard
///
/// Lets a scope hold guards over different resource kinds in one stack.
pub trait Guard: Send {
    /// Resource type name for logging/debugging
    fn resource_type(&self) -> &'static str;

    /// Get guard metadata
    fn metadata(&self) -> &GuardMetadata;

    /// Current lifecycle state
    fn state(&self) -> GuardState;

    /// Check if guard still owns its handle
    fn is_open(&self) -> bool {
        self.state() == GuardState::Open
    }

    /// Release the resource
    ///
    /// Idempotent: closing a closed guard succeeds without calling the
    /// back-end again.
    fn close(&mut self) -> GuardResult<()>;

    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;

    #[doc(hidden)]
    fn as_any_mut(&mut self) -> &mut dyn Any;

    #[doc(hidden)]
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}
