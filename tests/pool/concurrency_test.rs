/*!
 * Concurrency Tests
 * Balanced multi-threaded workloads and racing discards
 */

use super::common::test_pool;
use heap_buffer_pool::SharedBuffer;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;

const THREADS: usize = 8;
const ITERATIONS: usize = 2_000;

#[test]
fn test_balanced_workload_returns_everything() {
    let pool = test_pool();

    thread::scope(|scope| {
        for worker in 0..THREADS {
            let pool = &pool;
            scope.spawn(move || {
                for i in 0..ITERATIONS {
                    let size = (worker * 131 + i * 17) % 4096;
                    let handle = pool.allocate_silent(size, "worker");
                    match i % 3 {
                        0 => {
                            let slice = handle.slice("slice");
                            handle.discard_silent("worker");
                            slice.discard_silent("slice");
                        }
                        1 => {
                            let dup = handle.duplicate("dup");
                            dup.discard_silent("dup");
                            handle.discard_silent("worker");
                        }
                        _ => handle.discard_silent("worker"),
                    }
                }
            });
        }
    });

    assert!(pool.all_buffers_returned());
    assert_eq!(pool.live_handles(), 0);
    assert!(pool.leaked_handles().is_empty());
}

#[test]
fn test_racing_owners_release_once() {
    for _ in 0..200 {
        let pool = test_pool();
        let handle = pool.allocate(128, "root");
        let mut owners: Vec<SharedBuffer> = (0..THREADS - 1)
            .map(|i| handle.implicit_reference(&format!("owner-{i}")))
            .collect();
        owners.push(handle);

        let barrier = Barrier::new(owners.len());
        thread::scope(|scope| {
            for (i, owner) in owners.iter().enumerate() {
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    let tag = if i == THREADS - 1 {
                        "root".to_string()
                    } else {
                        format!("owner-{i}")
                    };
                    owner.discard(&tag);
                });
            }
        });

        assert!(owners[0].is_freed());
        assert!(pool.all_buffers_returned());
        assert_eq!(pool.stats().buckets[0].idle, 1);
    }
}

#[test]
fn test_slice_while_other_owner_discards() {
    for _ in 0..200 {
        let pool = test_pool();
        let base = pool.allocate(256, "base");
        let sliced = AtomicUsize::new(0);

        let held = base.implicit_reference("slicer");
        thread::scope(|scope| {
            scope.spawn(|| base.discard("base"));
            scope.spawn(|| {
                let slice = held.slice("slice");
                sliced.fetch_add(1, Ordering::Relaxed);
                held.discard("slicer");
                assert_eq!(slice.access().remaining(), 256);
                slice.discard("slice");
            });
        });

        assert_eq!(sliced.load(Ordering::Relaxed), 1);
        assert!(pool.all_buffers_returned());
        assert_eq!(pool.stats().fresh_allocations, 1);
    }
}

#[test]
fn test_shared_pool_across_spawned_threads() {
    let pool = test_pool();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = pool.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let handle = pool.allocate(64 + (i % 64), "spawned");
                    handle.access_mut().unwrap().put_u64(t as u64).unwrap();
                    let view = handle.duplicate_read_only("reader");
                    assert_eq!(view.access().get_u64().unwrap(), t as u64);
                    view.discard("reader");
                    handle.discard("spawned");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = pool.stats();
    assert!(stats.all_returned());
    assert!(stats.fresh_allocations <= 2 * THREADS as u64);
}

#[derive(Debug, Clone)]
enum Op {
    Allocate(usize),
    Slice(usize),
    Duplicate(usize),
    Reference(usize),
    Discard(usize),
    Advance(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..5000).prop_map(Op::Allocate),
        any::<usize>().prop_map(Op::Slice),
        any::<usize>().prop_map(Op::Duplicate),
        any::<usize>().prop_map(Op::Reference),
        any::<usize>().prop_map(Op::Discard),
        (any::<usize>(), 0usize..5000).prop_map(|(i, p)| Op::Advance(i, p)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_balanced_sequences_return_everything(ops in prop::collection::vec(op(), 1..64)) {
        let pool = test_pool();
        let mut live: Vec<SharedBuffer> = Vec::new();

        for op in ops {
            match op {
                Op::Allocate(size) => live.push(pool.allocate_silent(size, "p")),
                Op::Slice(i) if !live.is_empty() => {
                    let slice = live[i % live.len()].slice("p");
                    live.push(slice);
                }
                Op::Duplicate(i) if !live.is_empty() => {
                    let dup = live[i % live.len()].duplicate("p");
                    live.push(dup);
                }
                Op::Reference(i) if !live.is_empty() => {
                    let owner = live[i % live.len()].implicit_reference("p");
                    live.push(owner);
                }
                Op::Discard(i) if !live.is_empty() => {
                    let handle = live.swap_remove(i % live.len());
                    handle.discard_silent("p");
                }
                Op::Advance(i, position) if !live.is_empty() => {
                    let view = live[i % live.len()].access();
                    let position = position.min(view.limit());
                    prop_assert!(view.set_position(position).is_ok());
                }
                _ => {}
            }
        }

        let allocated = pool.stats().allocated_bytes;
        for handle in live.drain(..) {
            handle.discard_silent("p");
        }

        prop_assert!(pool.all_buffers_returned());
        prop_assert_eq!(pool.stats().allocated_bytes, allocated);
        prop_assert_eq!(pool.total_outstanding_bytes(), allocated);
        prop_assert_eq!(pool.live_handles(), 0);
        prop_assert!(pool.leaked_handles().is_empty());
    }
}
