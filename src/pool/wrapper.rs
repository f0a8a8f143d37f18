/*!
 * Buffer Wrapper
 * Owner of one fixed-size storage region shared by many handles
 */

use crate::core::types::{Size, WrapperId};
use parking_lot::RwLock;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One storage region and the number of live handles viewing it
///
/// `view_count` is only changed by handle construction and final handle
/// release. Storage bytes are guarded by a reader/writer lock so concurrent
/// views of the same region never alias mutably.
pub(crate) struct BufferWrapper {
    id: WrapperId,
    capacity: Size,
    storage: RwLock<Box<[u8]>>,
    view_count: AtomicUsize,
}

impl BufferWrapper {
    /// Wrap freshly allocated storage, checked out to one handle
    pub fn new(id: WrapperId, storage: Box<[u8]>) -> Self {
        Self {
            id,
            capacity: storage.len(),
            storage: RwLock::new(storage),
            view_count: AtomicUsize::new(1),
        }
    }

    #[inline]
    pub fn id(&self) -> WrapperId {
        self.id
    }

    /// Bucket capacity
    #[inline]
    pub fn capacity(&self) -> Size {
        self.capacity
    }

    /// Current view count (diagnostic snapshot)
    #[inline]
    pub fn view_count(&self) -> usize {
        self.view_count.load(Ordering::Acquire)
    }

    /// Check a recycled wrapper out to a single new handle
    ///
    /// Only called on a wrapper just taken from the arena, which no live
    /// handle references.
    #[inline]
    pub fn checkout(&self) {
        let previous = self.view_count.swap(1, Ordering::AcqRel);
        debug_assert_eq!(previous, 0, "wrapper {} checked out while in use", self.id);
    }

    /// Register one more handle viewing this storage, returning the new count
    #[inline]
    pub fn acquire_view(&self) -> usize {
        self.view_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Drop one handle's view, returning the remaining count
    ///
    /// The caller that observes zero owns the wrapper and must return it to
    /// the arena.
    #[inline]
    pub fn release_view(&self) -> usize {
        let previous = self.view_count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "wrapper {} view count underflow", self.id);
        previous - 1
    }

    pub fn read<R>(&self, range: Range<Size>, f: impl FnOnce(&[u8]) -> R) -> R {
        let storage = self.storage.read();
        f(&storage[range])
    }

    pub fn write<R>(&self, range: Range<Size>, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut storage = self.storage.write();
        f(&mut storage[range])
    }

    /// Move the storage out, leaving an empty region behind
    ///
    /// Used by the arena drain; stale references to a drained wrapper can no
    /// longer reach its bytes.
    pub fn take_storage(&self) -> Box<[u8]> {
        std::mem::take(&mut *self.storage.write())
    }
}

impl std::fmt::Debug for BufferWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferWrapper")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("view_count", &self.view_count())
            .finish()
    }
}
