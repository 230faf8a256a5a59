/*!
 * Scope Configuration
 *
 * Per-scope policies for capacity, slow-release reporting and implicit exit.
 */

use crate::core::limits::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Configuration applied to every guard registered with a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Pre-sized stack capacity (default: 8)
    pub initial_capacity: usize,

    /// Maximum open guards per scope, unbounded when `None`
    pub max_guards: Option<usize>,

    /// Releases slower than this are logged at warn level (default: 10ms)
    pub slow_release_threshold: Duration,

    /// Warn when a scope is unwound by `Drop` instead of `exit` (default: true)
    pub warn_on_implicit_exit: bool,
}

impl ScopeConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_SCOPE_CAPACITY,
            max_guards: None,
            slow_release_threshold: DEFAULT_SLOW_RELEASE,
            warn_on_implicit_exit: true,
        }
    }

    /// Tight limits for tests and latency-sensitive extents
    pub fn strict() -> Self {
        Self {
            initial_capacity: DEFAULT_SCOPE_CAPACITY,
            max_guards: Some(STRICT_MAX_GUARDS),
            slow_release_threshold: STRICT_SLOW_RELEASE,
            warn_on_implicit_exit: true,
        }
    }

    /// No cap and quiet logging, for slow back-ends
    pub fn relaxed() -> Self {
        Self {
            initial_capacity: DEFAULT_SCOPE_CAPACITY,
            max_guards: None,
            slow_release_threshold: RELAXED_SLOW_RELEASE,
            warn_on_implicit_exit: false,
        }
    }

    /// Defaults overlaid with environment variables
    ///
    /// Environment variables:
    /// - SCOPE_INITIAL_CAPACITY: stack capacity
    /// - SCOPE_MAX_GUARDS: guard cap (0 disables the cap)
    /// - SCOPE_SLOW_RELEASE_MS: slow release threshold in milliseconds
    /// - SCOPE_WARN_IMPLICIT_EXIT: "1"/"true" or "0"/"false"
    pub fn from_env() -> Self {
        Self::new().overlay(|key| std::env::var(key).ok())
    }

    fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(capacity) = parse_var(&lookup, "SCOPE_INITIAL_CAPACITY", |v| v.parse().ok()) {
            self.initial_capacity = capacity;
        }

        if let Some(max) = parse_var(&lookup, "SCOPE_MAX_GUARDS", |v| v.parse::<usize>().ok()) {
            self.max_guards = (max > 0).then_some(max);
        }

        if let Some(ms) = parse_var(&lookup, "SCOPE_SLOW_RELEASE_MS", |v| v.parse().ok()) {
            self.slow_release_threshold = Duration::from_millis(ms);
        }

        if let Some(warn) = parse_var(&lookup, "SCOPE_WARN_IMPLICIT_EXIT", parse_bool) {
            self.warn_on_implicit_exit = warn;
        }

        self
    }

    pub fn with_max_guards(mut self, max: usize) -> Self {
        self.max_guards = Some(max);
        self
    }

    pub fn with_slow_release_threshold(mut self, threshold: Duration) -> Self {
        self.slow_release_threshold = threshold;
        self
    }

    pub fn with_warn_on_implicit_exit(mut self, warn: bool) -> Self {
        self.warn_on_implicit_exit = warn;
        self
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_var<F, P, T>(lookup: &F, key: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let raw = lookup(key)?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(key, value = %raw, "Ignoring unparseable scope configuration value");
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
