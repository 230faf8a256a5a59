/*!
 * Scoped Guards
 *
 * Owns one acquired handle and releases it exactly once
 */

use super::traits::{Guard, Resource};
use super::{GuardMetadata, GuardState};
use crate::core::errors::{GuardError, GuardResult};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Guard over a single resource handle
///
/// Created only by a successful [`ScopedGuard::acquire`]; a failed
/// acquisition yields an error and no guard. The handle is released exactly
/// once, either by [`close`](ScopedGuard::close) or on drop.
///
/// # Example
///
/// ```ignore
/// let files = Arc::new(FileResource::new());
/// let mut guard = ScopedGuard::acquire(&files, FileParams::read("/etc/hosts"))?;
/// let len = guard.with(|file| file.metadata().map(|m| m.len()))??;
/// guard.close()?; // Or closed automatically on drop
/// ```
pub struct ScopedGuard<R: Resource> {
    resource: Arc<R>,
    handle: Option<R::Handle>,
    state: GuardState,
    metadata: GuardMetadata,
}

impl<R: Resource> ScopedGuard<R> {
    /// Acquire a resource and wrap it in an open guard
    pub fn acquire(resource: &Arc<R>, params: R::Params) -> GuardResult<Self> {
        let kind = resource.kind();
        let handle = resource.acquire(params).map_err(|e| {
            let err = GuardError::acquire(kind, e);
            debug!(resource_type = kind, error = %err, "acquire failed, no guard created");
            err
        })?;

        debug!(resource_type = kind, "resource acquired");

        Ok(Self {
            resource: Arc::clone(resource),
            handle: Some(handle),
            state: GuardState::Open,
            metadata: GuardMetadata::new(kind),
        })
    }

    /// Borrow the handle
    pub fn handle(&self) -> GuardResult<&R::Handle> {
        self.handle.as_ref().ok_or(GuardError::UseAfterClose {
            resource_type: self.metadata.resource_type,
        })
    }

    /// Mutably borrow the handle
    pub fn handle_mut(&mut self) -> GuardResult<&mut R::Handle> {
        let resource_type = self.metadata.resource_type;
        self.handle
            .as_mut()
            .ok_or(GuardError::UseAfterClose { resource_type })
    }

    /// Run an operation against the handle
    ///
    /// The operation's own result is returned untouched; only a closed guard
    /// produces an error here.
    pub fn with<F, T>(&mut self, op: F) -> GuardResult<T>
    where
        F: FnOnce(&mut R::Handle) -> T,
    {
        self.handle_mut().map(op)
    }

    /// Release the resource
    ///
    /// A closed guard returns `Ok(())` without touching the back-end. On
    /// release failure the guard is still closed and the error is returned.
    pub fn close(&mut self) -> GuardResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        self.state = GuardState::Closed;

        let kind = self.metadata.resource_type;
        let started = Instant::now();
        let result = self
            .resource
            .release(handle)
            .map_err(|e| GuardError::release(kind, e));

        match &result {
            Ok(()) => debug!(
                resource_type = kind,
                lifetime_us = self.metadata.lifetime_micros(),
                release_us = started.elapsed().as_micros() as u64,
                "resource released"
            ),
            Err(e) => error!(resource_type = kind, error = %e, "resource release failed"),
        }

        result
    }

    /// Close now and consume the guard
    pub fn close_early(mut self) -> GuardResult<()> {
        self.close()
    }

    /// Hand the guard to a new owner
    ///
    /// The moved-from binding is unusable afterwards, so only the receiver
    /// can close it. Closed guards can be moved too; they stay closed.
    #[must_use = "dropping the transferred guard releases the resource immediately"]
    pub fn transfer_ownership(mut self) -> Self {
        self.metadata.transfers += 1;
        debug!(
            resource_type = self.metadata.resource_type,
            transfers = self.metadata.transfers,
            "guard ownership transferred"
        );
        self
    }

    /// Descriptor this guard releases through
    pub fn resource(&self) -> &Arc<R> {
        &self.resource
    }

    #[inline]
    pub fn state(&self) -> GuardState {
        self.state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state == GuardState::Open
    }

    #[inline]
    pub fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }
}

impl<R> Guard for ScopedGuard<R>
where
    R: Resource + 'static,
    R::Handle: 'static,
{
    fn resource_type(&self) -> &'static str {
        self.metadata.resource_type
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn state(&self) -> GuardState {
        self.state
    }

    fn close(&mut self) -> GuardResult<()> {
        ScopedGuard::close(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl<R: Resource> fmt::Debug for ScopedGuard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedGuard")
            .field("resource_type", &self.metadata.resource_type)
            .field("state", &self.state)
            .field("transfers", &self.metadata.transfers)
            .finish()
    }
}

impl<R: Resource> Drop for ScopedGuard<R> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            // Already logged inside close
            let _ = self.close();
        }
    }
}
