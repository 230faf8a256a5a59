/*!
 * Error Types
 * Guard and scope errors with thiserror and miette support
 */

use miette::Diagnostic;
use thiserror::Error;

/// Type-erased error reported by a resource back-end
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Result type for scope exit
pub type ScopeResult<T> = Result<T, AggregateReleaseError>;

/// Errors that can occur during guard operations
#[derive(Error, Debug, Diagnostic)]
pub enum GuardError {
    #[error("Failed to acquire {resource_type} resource")]
    #[diagnostic(
        code(guard::acquire_failed),
        help("No guard was created, so nothing needs to be released for this resource.")
    )]
    Acquire {
        resource_type: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Use of {resource_type} guard after close")]
    #[diagnostic(
        code(guard::use_after_close),
        help("This is a logic error in the caller: the guard was already closed.")
    )]
    UseAfterClose { resource_type: &'static str },

    #[error("Failed to release {resource_type} resource")]
    #[diagnostic(
        code(guard::release_failed),
        help("The guard is closed regardless; the back-end may have leaked the resource.")
    )]
    Release {
        resource_type: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Scope holds {limit} guards, cannot register {resource_type}")]
    #[diagnostic(
        code(scope::capacity_exceeded),
        help("Raise max_guards in ScopeConfig or split the work into nested scopes.")
    )]
    CapacityExceeded {
        resource_type: &'static str,
        limit: usize,
    },

    #[error("Guard key does not belong to scope {scope_id}")]
    #[diagnostic(
        code(scope::foreign_key),
        help("Keys are only valid for the scope that issued them and only until the guard is taken.")
    )]
    ForeignKey { scope_id: uuid::Uuid },

    #[error("Scope {scope_id} already exited, cannot register {resource_type}")]
    #[diagnostic(
        code(scope::already_exited),
        help("A scope is single-use; enter a new scope for further acquisitions.")
    )]
    ScopeExited {
        scope_id: uuid::Uuid,
        resource_type: &'static str,
    },
}

impl GuardError {
    pub(crate) fn acquire<E>(resource_type: &'static str, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Acquire {
            resource_type,
            source: err.into(),
        }
    }

    pub(crate) fn release<E>(resource_type: &'static str, err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Release {
            resource_type,
            source: err.into(),
        }
    }

    /// Resource type the error refers to, when there is one
    pub fn resource_type(&self) -> Option<&'static str> {
        match self {
            Self::Acquire { resource_type, .. }
            | Self::UseAfterClose { resource_type }
            | Self::Release { resource_type, .. }
            | Self::CapacityExceeded { resource_type, .. }
            | Self::ScopeExited { resource_type, .. } => Some(*resource_type),
            Self::ForeignKey { .. } => None,
        }
    }

    #[inline]
    pub fn is_use_after_close(&self) -> bool {
        matches!(self, Self::UseAfterClose { .. })
    }

    #[inline]
    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release { .. })
    }
}

/// Every release failure collected while a scope unwound
///
/// Failures are kept in release order (newest guard first).
#[derive(Error, Debug, Diagnostic)]
#[error("{} release failure(s) during exit of scope {scope_id}", failures.len())]
#[diagnostic(
    code(scope::release_failed),
    help("All guards were still closed; inspect each failure for leaked back-end resources.")
)]
pub struct AggregateReleaseError {
    scope_id: uuid::Uuid,
    #[related]
    failures: Vec<GuardError>,
}

impl AggregateReleaseError {
    pub(crate) fn new(scope_id: uuid::Uuid, failures: Vec<GuardError>) -> Self {
        Self { scope_id, failures }
    }

    /// Scope that produced the failures
    pub fn scope_id(&self) -> uuid::Uuid {
        self.scope_id
    }

    /// Failures in release order
    pub fn failures(&self) -> &[GuardError] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<GuardError> {
        self.failures
    }
}

/// Outcome of [`crate::scoped`] when either the body or the unwind failed
#[derive(Error, Debug)]
pub enum ScopedError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Body(E),

    #[error(transparent)]
    Release(AggregateReleaseError),

    #[error("Scope body failed and {} release(s) also failed", release.len())]
    Both {
        #[source]
        body: E,
        release: AggregateReleaseError,
    },
}

impl<E> ScopedError<E>
where
    E: std::error::Error + 'static,
{
    /// Body error, if the body failed
    pub fn body(&self) -> Option<&E> {
        match self {
            Self::Body(e) | Self::Both { body: e, .. } => Some(e),
            Self::Release(_) => None,
        }
    }

    /// Release failures, if the unwind failed
    pub fn release(&self) -> Option<&AggregateReleaseError> {
        match self {
            Self::Release(r) | Self::Both { release: r, .. } => Some(r),
            Self::Body(_) => None,
        }
    }
}
