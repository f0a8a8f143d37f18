/*!
 * Storage Allocators
 * Fallible sources of raw bucket storage
 */

use super::traits::StorageAllocator;
use crate::core::errors::StorageError;
use crate::core::types::Size;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Process heap storage
///
/// Uses `try_reserve_exact` so heap exhaustion is reported instead of
/// aborting inside the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemStorage;

impl StorageAllocator for SystemStorage {
    fn allocate(&self, capacity: Size) -> Result<Box<[u8]>, StorageError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| StorageError::Exhausted { capacity })?;
        bytes.resize(capacity, 0);
        Ok(bytes.into_boxed_slice())
    }
}

/// Heap storage with a hard byte budget
///
/// Behaves like [`SystemStorage`] until `limit` bytes are outstanding, then
/// reports exhaustion. Released regions return their bytes to the budget.
#[derive(Debug)]
pub struct LimitedStorage {
    limit: Size,
    used: AtomicUsize,
}

impl LimitedStorage {
    pub fn new(limit: Size) -> Self {
        Self {
            limit,
            used: AtomicUsize::new(0),
        }
    }

    pub fn limit(&self) -> Size {
        self.limit
    }

    /// Bytes currently handed out
    pub fn used(&self) -> Size {
        self.used.load(Ordering::Acquire)
    }
}

impl StorageAllocator for LimitedStorage {
    fn allocate(&self, capacity: Size) -> Result<Box<[u8]>, StorageError> {
        let reserved = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(capacity)
                    .filter(|&total| total <= self.limit)
            });

        if let Err(used) = reserved {
            debug!(
                requested = capacity,
                used,
                limit = self.limit,
                "Storage budget exhausted"
            );
            return Err(StorageError::Exhausted { capacity });
        }

        SystemStorage.allocate(capacity).inspect_err(|_| {
            self.used.fetch_sub(capacity, Ordering::AcqRel);
        })
    }

    fn release(&self, storage: Box<[u8]>) {
        self.used.fetch_sub(storage.len(), Ordering::AcqRel);
    }
}
