/*!
 * Allocation Tests
 * Bucket sizing, arena reuse and byte accounting
 */

use super::common::test_pool;
use heap_buffer_pool::{next_pow2, PoolDiagnostics};
use pretty_assertions::assert_eq;

#[test]
fn test_limit_is_request_and_capacity_is_bucket() {
    let pool = test_pool();
    let handle = pool.allocate(100, "req");

    assert_eq!(handle.access().limit(), 100);
    assert_eq!(handle.access().position(), 0);
    assert_eq!(handle.capacity(), 128);
    assert_eq!(handle.bucket_capacity(), 128);
    assert_eq!(pool.stats().allocated_bytes, 128);
    assert_eq!(pool.total_outstanding_bytes(), 0);

    handle.discard("req");
    assert_eq!(pool.total_outstanding_bytes(), 128);
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_bucket_sizes() {
    assert_eq!(next_pow2(0), 0);
    assert_eq!(next_pow2(1), 2);
    assert_eq!(next_pow2(2), 2);
    assert_eq!(next_pow2(3), 4);
    assert_eq!(next_pow2(1024), 1024);
    assert_eq!(next_pow2(1025), 2048);
}

#[test]
fn test_zero_byte_request() {
    let pool = test_pool();
    let handle = pool.allocate(0, "empty");
    assert_eq!(handle.bucket_capacity(), 0);
    assert_eq!(handle.access().remaining(), 0);
    handle.discard("empty");
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_reuse_keeps_counter_flat() {
    let pool = test_pool();
    let first = pool.allocate(1000, "first");
    let wrapper = first.wrapper_id();
    first.discard("first");
    let before = pool.stats().allocated_bytes;

    let second = pool.allocate(600, "second");
    assert_eq!(second.wrapper_id(), wrapper);
    assert_eq!(second.wrapper_view_count(), 1);
    assert_eq!(second.access().limit(), 600);
    assert_eq!(pool.stats().allocated_bytes, before);
    assert_eq!(pool.total_outstanding_bytes(), 0);

    second.discard("second");
    let stats = pool.stats();
    assert_eq!(stats.fresh_allocations, 1);
    assert_eq!(stats.reused_allocations, 1);
    assert_eq!(stats.reuse_ratio(), 0.5);
}

#[test]
fn test_buckets_are_separate() {
    let pool = test_pool();
    let small = pool.allocate(10, "small");
    let large = pool.allocate(5000, "large");
    small.discard("small");
    large.discard("large");

    let stats = PoolDiagnostics::stats(&pool);
    let idle: Vec<(usize, usize)> = stats.buckets.iter().map(|b| (b.capacity, b.idle)).collect();
    assert_eq!(idle, vec![(16, 1), (8192, 1)]);
    assert_eq!(stats.idle_bytes, 16 + 8192);

    let again = pool.allocate(9, "again");
    assert_eq!(again.bucket_capacity(), 16);
    again.discard("again");
}

#[test]
fn test_outstanding_while_checked_out() {
    let pool = test_pool();
    let handles: Vec<_> = (0..4).map(|_| pool.allocate(64, "batch")).collect();
    assert!(!pool.all_buffers_returned());
    assert_eq!(pool.stats().checked_out_bytes(), 256);

    for handle in &handles {
        handle.discard("batch");
    }
    assert!(pool.all_buffers_returned());
    assert_eq!(pool.live_handles(), 0);
}

#[test]
fn test_stats_serialize() {
    let pool = test_pool();
    pool.allocate(32, "json").discard("json");
    let json = serde_json::to_value(pool.stats()).unwrap();
    assert_eq!(json["allocated_bytes"], 32);
    assert_eq!(json["buckets"][0]["capacity"], 32);
}

#[test]
fn test_outstanding_bytes_are_the_idle_sum() {
    let pool = test_pool();
    let held = pool.allocate(100, "held");
    let idle: Vec<_> = [10, 10, 3000].iter().map(|&n| pool.allocate(n, "idle")).collect();
    for handle in &idle {
        handle.discard("idle");
    }

    let stats = pool.stats();
    let bucket_sum: usize = stats.buckets.iter().map(|b| b.capacity * b.idle).sum();
    assert_eq!(pool.total_outstanding_bytes(), bucket_sum);
    assert_eq!(pool.total_outstanding_bytes(), 16 + 16 + 4096);
    assert_eq!(stats.allocated_bytes, 128 + 16 + 16 + 4096);
    assert!(!pool.all_buffers_returned());

    held.discard("held");
    assert_eq!(pool.total_outstanding_bytes(), pool.stats().allocated_bytes);
    assert!(pool.all_buffers_returned());
}
