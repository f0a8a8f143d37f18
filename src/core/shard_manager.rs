/*!
 * Shard Configuration
 *
 * CPU-topology-aware shard count calculation for the arena registry map.
 * Pure functions rather than a singleton so calls inline.
 *
 * - Power-of-2 shards: fast modulo via bitwise AND (x & (n-1))
 * - CPU-proportional scaling
 */

use super::limits::{ARENA_SHARD_MULTIPLIER, FALLBACK_CPU_COUNT, MAX_SHARDS, MIN_SHARDS};
use tracing::warn;

/// Hardware-aware shard configuration (pure functions)
pub struct ShardManager;

impl ShardManager {
    /// Available parallelism, or a fixed fallback when it cannot be detected
    #[inline]
    pub fn cpu_count() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or_else(|_| {
                warn!(
                    fallback = FALLBACK_CPU_COUNT,
                    "Failed to detect CPU count, using fallback"
                );
                FALLBACK_CPU_COUNT
            })
    }

    /// Shard count for the arena registry
    ///
    /// Every allocation and final discard touches the registry, so it gets
    /// [`ARENA_SHARD_MULTIPLIER`] shards per CPU core.
    #[inline]
    pub fn arena_shards() -> usize {
        Self::normalize(Self::cpu_count().saturating_mul(ARENA_SHARD_MULTIPLIER))
    }

    /// Round a requested shard count to a power of two within bounds
    ///
    /// DashMap requires a power-of-two shard amount greater than one.
    #[inline]
    pub fn normalize(requested: usize) -> usize {
        requested
            .checked_next_power_of_two()
            .unwrap_or(MAX_SHARDS)
            .clamp(MIN_SHARDS, MAX_SHARDS)
    }
}
