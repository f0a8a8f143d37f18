/*!
 * Exhaustion Tests
 * Arena drain and single retry against a bounded storage allocator
 */

use heap_buffer_pool::{BufferPool, LimitedStorage, PanicOnFatal, PoolConfig};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn bounded_pool(limit: usize) -> (BufferPool, Arc<LimitedStorage>) {
    let storage = Arc::new(LimitedStorage::new(limit));
    let pool = BufferPool::builder()
        .with_config(PoolConfig::diagnostic())
        .with_storage(storage.clone())
        .with_fatal_handler(Arc::new(PanicOnFatal))
        .build();
    (pool, storage)
}

#[test]
fn test_drain_frees_room_for_retry() {
    let (pool, storage) = bounded_pool(1024);
    let warm: Vec<_> = [256, 256, 512]
        .into_iter()
        .map(|size| pool.allocate(size, "warm"))
        .collect();
    for handle in &warm {
        handle.discard("warm");
    }
    assert_eq!(storage.used(), 1024);
    assert_eq!(pool.stats().allocated_bytes, 1024);
    assert_eq!(pool.total_outstanding_bytes(), 1024);

    let big = pool.allocate(1000, "big");
    assert_eq!(big.bucket_capacity(), 1024);
    assert_eq!(storage.used(), 1024);
    assert_eq!(pool.stats().allocated_bytes, 1024);
    assert_eq!(pool.total_outstanding_bytes(), 0);
    assert_eq!(pool.stats().arena_drains, 1);
    assert_eq!(pool.stats().idle_bytes, 0);

    big.discard("big");
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_reuse_never_touches_storage() {
    let (pool, storage) = bounded_pool(128);
    for _ in 0..100 {
        pool.allocate(100, "hot").discard("hot");
    }
    assert_eq!(storage.used(), 128);
    assert_eq!(pool.stats().arena_drains, 0);
}

#[test]
fn test_explicit_drain() {
    let (pool, storage) = bounded_pool(4096);
    let held = pool.allocate(64, "held");
    pool.allocate(256, "idle").discard("idle");

    assert_eq!(pool.total_outstanding_bytes(), 256);
    assert_eq!(pool.drain_arena(), 256);
    assert_eq!(storage.used(), 64);
    assert_eq!(pool.stats().allocated_bytes, 64);
    assert_eq!(pool.total_outstanding_bytes(), 0);

    held.discard("held");
    assert!(pool.all_buffers_returned());
}

#[test]
#[should_panic(expected = "pool exhausted")]
fn test_exhaustion_after_retry_is_fatal() {
    let (pool, _storage) = bounded_pool(768);
    let _held = pool.allocate(300, "held");
    pool.allocate(200, "idle").discard("idle");
    let _ = pool.allocate(400, "too-big");
}
