/*!
 * Global Allocator
 *
 * Serves requests from the arena when a bucket has idle storage, otherwise
 * from the storage allocator. On storage exhaustion the whole arena is
 * drained back to the allocator and the request is retried once.
 */

use super::handle::SharedBuffer;
use super::sizing::next_pow2;
use super::wrapper::BufferWrapper;
use super::{BufferPool, PoolShared};
use crate::core::errors::{PoolError, StorageError};
use crate::core::types::Size;
use std::sync::Arc;
use tracing::warn;

impl BufferPool {
    /// Check out a buffer whose limit is exactly `size` bytes
    ///
    /// The backing capacity is `next_pow2(size)`. Escalates fatally with
    /// [`PoolError::PoolExhaustion`] if storage cannot be found even after
    /// draining the arena.
    pub fn allocate(&self, size: Size, tag: &str) -> SharedBuffer {
        self.checkout(size, tag, true)
    }

    /// [`allocate`](Self::allocate) without TRACE events
    pub fn allocate_silent(&self, size: Size, tag: &str) -> SharedBuffer {
        self.checkout(size, tag, false)
    }

    fn checkout(&self, size: Size, tag: &str, logging: bool) -> SharedBuffer {
        let shared = &self.shared;
        let bucket = next_pow2(size);

        let wrapper = match shared.registry.take(bucket) {
            Some(wrapper) => {
                wrapper.checkout();
                shared.counters.reused();
                wrapper
            }
            None => Arc::new(BufferWrapper::new(
                shared.wrapper_ids.next_id(),
                shared.fresh_storage(size, bucket),
            )),
        };

        let handle = SharedBuffer::checked_out(Arc::clone(shared), wrapper, size, tag);
        if shared.trace_enabled(logging) {
            handle.trace_allocated(tag);
        }
        handle
    }

    /// Return every idle buffer to the storage allocator
    ///
    /// Returns the number of bytes reclaimed.
    pub fn drain_arena(&self) -> Size {
        self.shared.drain_arena()
    }
}

impl PoolShared {
    fn fresh_storage(&self, requested: Size, bucket: Size) -> Box<[u8]> {
        let storage = match self.storage.allocate(bucket) {
            Ok(storage) => storage,
            Err(StorageError::Exhausted { .. }) => {
                let reclaimed = self.drain_arena();
                match self.storage.allocate(bucket) {
                    Ok(storage) => storage,
                    Err(StorageError::Exhausted { .. }) => self.fatal(PoolError::PoolExhaustion {
                        requested,
                        bucket,
                        reclaimed,
                        allocated: self.counters.allocated_bytes(),
                    }),
                }
            }
        };
        self.counters.fresh(bucket);
        storage
    }

    pub(crate) fn drain_arena(&self) -> Size {
        let starting = self.counters.allocated_bytes();
        let reclaimed: Size = self
            .registry
            .drain()
            .into_iter()
            .map(|wrapper| {
                let capacity = wrapper.capacity();
                self.storage.release(wrapper.take_storage());
                capacity
            })
            .sum();
        let remaining = self.counters.reclaimed(reclaimed);
        self.counters.drained();

        warn!(
            starting,
            remaining,
            reclaimed,
            "Drained buffer arena after storage exhaustion"
        );
        reclaimed
    }
}
