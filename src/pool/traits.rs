/*!
 * Pool Traits
 * Seams for storage sourcing, fatal escalation and diagnostics
 */

use super::types::PoolStats;
use crate::core::errors::{PoolError, StorageError};
use crate::core::types::Size;

/// Source of raw bucket storage
///
/// `allocate` must return a zero-initialised region of exactly `capacity`
/// bytes or report exhaustion; it must not abort on its own.
#[cfg_attr(test, mockall::automock)]
pub trait StorageAllocator: Send + Sync {
    /// Allocate a region of `capacity` bytes
    fn allocate(&self, capacity: Size) -> Result<Box<[u8]>, StorageError>;

    /// Give a region back when the arena is drained
    fn release(&self, storage: Box<[u8]>) {
        drop(storage);
    }
}

/// Receives fatal pool errors before the process is terminated
///
/// If `on_fatal` returns, the process aborts.
pub trait FatalHandler: Send + Sync {
    fn on_fatal(&self, error: &PoolError);
}

/// Whole-pool health checks
pub trait PoolDiagnostics: Send + Sync {
    /// Bytes idle in the arena, summed over every bucket
    fn total_outstanding_bytes(&self) -> Size;

    /// The idle sum equals the fresh-allocation counter
    fn all_buffers_returned(&self) -> bool;

    /// Statistics snapshot
    fn stats(&self) -> PoolStats;
}
