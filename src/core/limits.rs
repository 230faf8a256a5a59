/*!
 * Scope Limits and Constants
 *
 * Default values for scope configuration and the built-in resource
 * descriptors. Grouped by domain.
 */

use std::time::Duration;

// =============================================================================
// SCOPE LIMITS
// =============================================================================

/// Initial stack capacity for a new scope
/// [PERF] Most extents hold a handful of guards; avoids early reallocation
pub const DEFAULT_SCOPE_CAPACITY: usize = 8;

/// Guard cap used by the strict preset
pub const STRICT_MAX_GUARDS: usize = 64;

// =============================================================================
// RELEASE TIMING
// =============================================================================

/// Releases slower than this are logged at warn level (10ms)
pub const DEFAULT_SLOW_RELEASE: Duration = Duration::from_millis(10);

/// Slow release threshold for the strict preset (1ms)
pub const STRICT_SLOW_RELEASE: Duration = Duration::from_millis(1);

/// Slow release threshold for the relaxed preset (1s)
pub const RELAXED_SLOW_RELEASE: Duration = Duration::from_secs(1);

// =============================================================================
// RESOURCE DESCRIPTORS
// =============================================================================

/// Default byte budget for an arena descriptor (16MB)
pub const DEFAULT_ARENA_BUDGET: usize = 16 * 1024 * 1024;

/// Default timeout when acquiring a lock descriptor (5s)
/// Prevents a critical section from waiting forever on a leaked lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
