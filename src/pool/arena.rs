/*!
 * Arena Registry
 * Per-bucket free lists of idle storage
 */

use super::types::BucketStats;
use super::wrapper::BufferWrapper;
use crate::core::types::Size;
use ahash::RandomState;
use crossbeam_queue::SegQueue;
use dashmap::DashMap;
use std::sync::Arc;

type FreeList = Arc<SegQueue<Arc<BufferWrapper>>>;

/// Bucket capacity -> idle wrappers of that capacity
///
/// Buckets are created lazily on first use and never removed. Shard locks
/// are held only long enough to clone a free list out of the map; pushes and
/// pops go to the lock-free queue.
pub(crate) struct ArenaRegistry {
    buckets: DashMap<Size, FreeList, RandomState>,
}

impl ArenaRegistry {
    pub fn with_shard_amount(shard_amount: usize) -> Self {
        Self {
            buckets: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                shard_amount,
            ),
        }
    }

    fn free_list(&self, capacity: Size) -> FreeList {
        if let Some(list) = self.buckets.get(&capacity) {
            return Arc::clone(list.value());
        }
        Arc::clone(
            self.buckets
                .entry(capacity)
                .or_insert_with(|| Arc::new(SegQueue::new()))
                .value(),
        )
    }

    /// Pop an idle wrapper of exactly `capacity`
    pub fn take(&self, capacity: Size) -> Option<Arc<BufferWrapper>> {
        self.free_list(capacity).pop()
    }

    /// Park a wrapper whose view count reached zero
    pub fn give(&self, wrapper: Arc<BufferWrapper>) {
        self.free_list(wrapper.capacity()).push(wrapper);
    }

    /// Empty every bucket, returning the idle wrappers
    pub fn drain(&self) -> Vec<Arc<BufferWrapper>> {
        let lists: Vec<FreeList> = self
            .buckets
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut drained = Vec::new();
        for list in lists {
            while let Some(wrapper) = list.pop() {
                drained.push(wrapper);
            }
        }
        drained
    }

    /// Sum of capacity x idle count over all buckets
    pub fn idle_bytes(&self) -> Size {
        self.buckets
            .iter()
            .map(|entry| entry.key().saturating_mul(entry.value().len()))
            .fold(0, Size::saturating_add)
    }

    /// Idle counts per bucket, smallest bucket first
    pub fn bucket_stats(&self) -> Vec<BucketStats> {
        let mut stats: Vec<BucketStats> = self
            .buckets
            .iter()
            .map(|entry| BucketStats {
                capacity: *entry.key(),
                idle: entry.value().len(),
            })
            .collect();
        stats.sort_by_key(|bucket| bucket.capacity);
        stats
    }
}
