/*!
 * Shared Handle Tests
 * Slicing, duplication, implicit references and view counting
 */

use super::common::test_pool;
use heap_buffer_pool::{AccessMode, PoolError};
use pretty_assertions::assert_eq;

#[test]
fn test_two_slices_release_in_any_order() {
    let pool = test_pool();
    let base = pool.allocate(64, "base");
    let first = base.slice("first");
    let second = base.slice("second");
    assert_eq!(base.wrapper_view_count(), 3);

    base.discard("base");
    first.discard("first");
    assert_eq!(second.wrapper_view_count(), 1);
    assert!(!pool.all_buffers_returned());

    second.discard("second");
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_slice_covers_remaining() {
    let pool = test_pool();
    let base = pool.allocate(10, "base");
    {
        let view = base.access_mut().unwrap();
        view.put(b"headbody!!").unwrap();
        view.set_position(4).unwrap();
    }

    let slice = base.slice("body");
    assert_eq!(slice.capacity(), 6);
    assert_eq!(slice.access().limit(), 6);
    assert_eq!(slice.access().to_vec(), b"body!!".to_vec());

    slice.access_mut().unwrap().put(b"BO").unwrap();
    base.access().rewind();
    assert_eq!(base.access().to_vec(), b"headBOdy!!".to_vec());

    slice.discard("body");
    base.discard("base");
}

#[test]
fn test_duplicate_has_independent_cursor() {
    let pool = test_pool();
    let base = pool.allocate(20, "base");
    base.access().set_position(5).unwrap();

    let dup = base.duplicate("dup");
    assert_eq!(dup.access().position(), 5);
    assert_eq!(dup.access().limit(), 20);
    assert_eq!(dup.capacity(), 32);

    dup.access().set_position(15).unwrap();
    assert_eq!(base.access().position(), 5);

    dup.discard("dup");
    base.discard("base");
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_read_only_views_refuse_writes() {
    let pool = test_pool();
    let base = pool.allocate(8, "base");
    let ro = base.duplicate_read_only("ro");
    let ro_slice = base.slice_read_only("ro-slice");

    assert_eq!(ro.mode(), AccessMode::ReadOnly);
    assert_eq!(
        ro.access_mut().err(),
        Some(PoolError::ReadOnly { handle: ro.id() })
    );
    assert!(ro_slice.access_mut().is_err());

    let derived = ro.duplicate("derived");
    assert!(derived.is_read_only());
    assert!(base.access_mut().is_ok());

    for (handle, tag) in [(&derived, "derived"), (&ro_slice, "ro-slice"), (&ro, "ro"), (&base, "base")] {
        handle.discard(tag);
    }
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_implicit_reference_shares_handle() {
    let pool = test_pool();
    let base = pool.allocate(16, "owner");
    let other = base.implicit_reference("borrower");

    assert_eq!(other.id(), base.id());
    assert_eq!(base.owner_count(), 2);
    assert_eq!(base.wrapper_view_count(), 1);

    other.access().set_position(3).unwrap();
    assert_eq!(base.access().position(), 3);

    base.discard("owner");
    assert!(!other.is_freed());
    assert_eq!(other.tags().len(), 1);
    other.discard("borrower");
    assert!(base.is_freed());
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_freed_even_while_wrapper_is_shared() {
    let pool = test_pool();
    let base = pool.allocate(16, "base");
    let dup = base.duplicate("dup");

    base.discard("base");
    assert!(base.is_freed());
    assert_eq!(base.owner_count(), 0);
    assert_eq!(dup.wrapper_view_count(), 1);

    dup.discard("dup");
    assert!(pool.all_buffers_returned());
}

#[test]
fn test_slice_of_slice_windows() {
    let pool = test_pool();
    let base = pool.allocate(16, "base");
    base.access_mut()
        .unwrap()
        .write(|bytes| bytes.copy_from_slice(b"0123456789abcdef"));

    base.access().set_position(4).unwrap();
    let outer = base.slice("outer");
    outer.access().set_position(6).unwrap();
    let inner = outer.slice("inner");

    assert_eq!(inner.capacity(), 6);
    assert_eq!(inner.access().copy_to_bytes().as_ref(), b"abcdef");
    assert_eq!(base.wrapper_view_count(), 3);

    for (handle, tag) in [(&inner, "inner"), (&outer, "outer"), (&base, "base")] {
        handle.discard(tag);
    }
    assert!(pool.all_buffers_returned());
}
