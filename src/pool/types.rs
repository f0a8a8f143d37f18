/*!
 * Pool Types
 * Access modes, statistics snapshots and leak reports
 */

use crate::core::errors::PoolError;
use crate::core::types::{HandleId, Size, Tag, WrapperId};
use serde::{Deserialize, Serialize};

/// Whether a handle's view permits writes
///
/// Fixed when the handle is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    /// A view derived from a read-only view stays read-only
    #[inline]
    pub(crate) fn narrow(self, requested: AccessMode) -> AccessMode {
        match self {
            AccessMode::ReadOnly => AccessMode::ReadOnly,
            AccessMode::ReadWrite => requested,
        }
    }
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AccessMode::ReadWrite => write!(f, "RW"),
            AccessMode::ReadOnly => write!(f, "RO"),
        }
    }
}

/// Idle storage held by one arena bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    pub capacity: Size,
    pub idle: usize,
}

impl BucketStats {
    pub fn idle_bytes(&self) -> Size {
        self.capacity.saturating_mul(self.idle)
    }
}

/// Point-in-time pool statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    /// Bytes freshly allocated and not yet reclaimed by an arena drain
    pub allocated_bytes: Size,
    /// Bytes resting in arena buckets
    pub idle_bytes: Size,
    /// Handles constructed and not yet fully discarded
    pub live_handles: usize,
    /// Handles dropped without their final discard
    pub leaked_handles: usize,
    /// Requests served with fresh storage
    pub fresh_allocations: u64,
    /// Requests served from an arena bucket
    pub reused_allocations: u64,
    /// Arena drains performed by out-of-memory recovery
    pub arena_drains: u64,
    pub buckets: Vec<BucketStats>,
}

impl PoolStats {
    /// Bytes currently checked out to live handles
    pub fn checked_out_bytes(&self) -> Size {
        self.allocated_bytes.saturating_sub(self.idle_bytes)
    }

    /// Every freshly allocated byte is idle in some bucket
    pub fn all_returned(&self) -> bool {
        self.allocated_bytes == self.idle_bytes
    }

    /// Fraction of requests served from the arena
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.fresh_allocations + self.reused_allocations;
        if total == 0 {
            0.0
        } else {
            self.reused_allocations as f64 / total as f64
        }
    }
}

/// A handle that went out of scope while still owned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakReport {
    pub handle: HandleId,
    pub wrapper: WrapperId,
    pub capacity: Size,
    pub owners: usize,
    pub tags: Vec<Tag>,
}

impl From<LeakReport> for PoolError {
    fn from(report: LeakReport) -> Self {
        PoolError::LeakedHandle {
            handle: report.handle,
            wrapper: report.wrapper,
            capacity: report.capacity,
            owners: report.owners,
            tags: report.tags,
        }
    }
}
