/*!
 * Pool Limits and Constants
 *
 * Centralized location for bucket sizing constants, shard bounds and the
 * environment variables read by the pool configuration.
 */

// =============================================================================
// BUCKET SIZING
// =============================================================================

/// Smallest non-empty bucket (2 bytes)
/// A request for a single byte is served from this bucket; a 1-byte bucket
/// is never created.
pub const MIN_BUCKET: usize = 2;

/// Bucket used for zero-length requests
pub const EMPTY_BUCKET: usize = 0;

// =============================================================================
// CONCURRENCY
// =============================================================================

/// Lower bound on arena registry shards
pub const MIN_SHARDS: usize = 8;

/// Upper bound on arena registry shards
/// [PERF] Diminishing returns past this point, excessive memory overhead
pub const MAX_SHARDS: usize = 512;

/// Arena registry shards per CPU core
pub const ARENA_SHARD_MULTIPLIER: usize = 4;

/// Fallback CPU count when topology detection fails
pub const FALLBACK_CPU_COUNT: usize = 8;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Enable/disable per-allocation TRACE events ("1"/"true" or "0"/"false")
pub const ENV_TRACE_ALLOCATIONS: &str = "HBB_POOL_TRACE";

/// Enable/disable leak detection on handle drop
pub const ENV_LEAK_DETECTION: &str = "HBB_POOL_LEAK_DETECTION";

/// Override the arena registry shard count
pub const ENV_SHARDS: &str = "HBB_POOL_SHARDS";

/// Emit JSON-formatted logs from the tracing subscriber
pub const ENV_TRACE_JSON: &str = "HBB_POOL_TRACE_JSON";
