/*!
 * Core Module
 * Guards, scopes, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod guard;
pub mod limits;

// Re-export for convenience
pub use config::ScopeConfig;
pub use errors::*;
pub use guard::{
    scoped, scoped_with, FnResource, Guard, GuardKey, GuardMetadata, GuardState, Resource, Scope,
    ScopedGuard,
};
