/*!
 * Pool Diagnostics
 * Lock-free counters and the read-only diagnostics surface
 */

use super::traits::PoolDiagnostics;
use super::types::{LeakReport, PoolStats};
use super::{BufferPool, PoolShared};
use crate::core::errors::PoolError;
use crate::core::types::Size;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, error};

/// Atomic pool counters
///
/// Cache-line aligned; updated on every allocate and release.
#[repr(C, align(64))]
pub(crate) struct PoolCounters {
    allocated_bytes: AtomicUsize,
    live_handles: AtomicUsize,
    leaked_handles: AtomicUsize,
    fresh_allocations: AtomicU64,
    reused_allocations: AtomicU64,
    arena_drains: AtomicU64,
}

impl PoolCounters {
    pub const fn new() -> Self {
        Self {
            allocated_bytes: AtomicUsize::new(0),
            live_handles: AtomicUsize::new(0),
            leaked_handles: AtomicUsize::new(0),
            fresh_allocations: AtomicU64::new(0),
            reused_allocations: AtomicU64::new(0),
            arena_drains: AtomicU64::new(0),
        }
    }

    #[inline(always)]
    pub fn allocated_bytes(&self) -> Size {
        self.allocated_bytes.load(Ordering::Acquire)
    }

    /// Record fresh storage, returning the new total
    #[inline]
    pub fn fresh(&self, bytes: Size) -> Size {
        self.fresh_allocations.fetch_add(1, Ordering::Relaxed);
        self.allocated_bytes.fetch_add(bytes, Ordering::AcqRel) + bytes
    }

    #[inline(always)]
    pub fn reused(&self) {
        self.reused_allocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record storage handed back to the allocator, returning the new total
    #[inline]
    pub fn reclaimed(&self, bytes: Size) -> Size {
        self.allocated_bytes.fetch_sub(bytes, Ordering::AcqRel) - bytes
    }

    #[inline(always)]
    pub fn drained(&self) {
        self.arena_drains.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn handle_created(&self) {
        self.live_handles.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn handle_released(&self) {
        self.live_handles.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn handle_leaked(&self) {
        self.leaked_handles.fetch_add(1, Ordering::Relaxed);
    }
}

impl PoolShared {
    /// Record a handle dropped while still owned
    pub(crate) fn report_leak(&self, report: LeakReport) {
        if !self.config.leak_detection {
            debug!(handle = report.handle, owners = report.owners, "Handle dropped while owned");
            return;
        }
        let error = PoolError::from(report.clone());
        error!(
            handle = report.handle,
            wrapper = report.wrapper,
            capacity = report.capacity,
            owners = report.owners,
            tags = ?report.tags,
            "{}",
            error
        );
        self.counters.handle_leaked();
        self.leaks.lock().push(report);
    }
}

impl BufferPool {
    /// Bytes resting idle in the arena: bucket capacity x idle count, summed
    /// over every bucket
    ///
    /// The fresh-allocation counter is reported by
    /// [`stats`](Self::stats) as `allocated_bytes`.
    pub fn total_outstanding_bytes(&self) -> Size {
        self.shared.registry.idle_bytes()
    }

    /// True when every byte ever allocated sits idle in the arena
    ///
    /// Only meaningful while no other thread is allocating or discarding.
    pub fn all_buffers_returned(&self) -> bool {
        self.shared.counters.allocated_bytes() == self.total_outstanding_bytes()
    }

    /// Handles constructed and not yet fully discarded
    pub fn live_handles(&self) -> usize {
        self.shared.counters.live_handles.load(Ordering::Relaxed)
    }

    /// Leaks recorded so far (requires leak detection)
    pub fn leaked_handles(&self) -> Vec<LeakReport> {
        self.shared.leaks.lock().clone()
    }

    pub fn stats(&self) -> PoolStats {
        let counters = &self.shared.counters;
        PoolStats {
            allocated_bytes: counters.allocated_bytes(),
            idle_bytes: self.shared.registry.idle_bytes(),
            live_handles: counters.live_handles.load(Ordering::Relaxed),
            leaked_handles: counters.leaked_handles.load(Ordering::Relaxed),
            fresh_allocations: counters.fresh_allocations.load(Ordering::Relaxed),
            reused_allocations: counters.reused_allocations.load(Ordering::Relaxed),
            arena_drains: counters.arena_drains.load(Ordering::Relaxed),
            buckets: self.shared.registry.bucket_stats(),
        }
    }
}

impl PoolDiagnostics for BufferPool {
    fn total_outstanding_bytes(&self) -> Size {
        BufferPool::total_outstanding_bytes(self)
    }

    fn all_buffers_returned(&self) -> bool {
        BufferPool::all_buffers_returned(self)
    }

    fn stats(&self) -> PoolStats {
        BufferPool::stats(self)
    }
}
