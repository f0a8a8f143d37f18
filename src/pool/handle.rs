/*!
 * Shared Buffer Handles
 *
 * A handle is a window over one wrapper's storage with its own cursor, owner
 * count and tag set. Two counters govern release:
 *
 * - the handle's owner count: `Live(n)` for `n > 0`, `Freed` at zero; every
 *   transition is a compare-and-exchange, so exactly one discard observes
 *   `Live(1) -> Freed`
 * - the wrapper's view count: decremented only by that winning discard; the
 *   caller that takes it to zero returns the storage to the arena
 *
 * Slicing and duplicating pin the source handle for the duration of the
 * derivation so the wrapper cannot be recycled between the liveness check
 * and the view count increment.
 */

use super::types::{AccessMode, LeakReport};
use super::view::{BufferView, BufferViewMut};
use super::wrapper::BufferWrapper;
use super::PoolShared;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::{HandleId, Size, Tag, WrapperId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Fixed bounds of a handle's window, relative to the wrapper's storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub offset: Size,
    pub capacity: Size,
}

/// Movable read/write cursor inside a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub position: Size,
    pub limit: Size,
}

pub(crate) struct HandleInner {
    pub(crate) id: HandleId,
    pub(crate) pool: Arc<PoolShared>,
    pub(crate) wrapper: Arc<BufferWrapper>,
    pub(crate) mode: AccessMode,
    pub(crate) window: Window,
    pub(crate) cursor: Mutex<Cursor>,
    owners: AtomicUsize,
    tags: Mutex<Vec<Tag>>,
}

/// Caller-facing handle to pooled storage
///
/// Obtained from [`BufferPool::allocate`](super::BufferPool::allocate) or by
/// slicing/duplicating another handle. Every owner calls
/// [`discard`](Self::discard) exactly once; misuse (discarding too often,
/// touching a released handle) is fatal.
pub struct SharedBuffer {
    inner: Arc<HandleInner>,
}

/// Temporary extra owner held while deriving a new handle
struct OwnerPin<'a> {
    handle: &'a HandleInner,
}

impl Drop for OwnerPin<'_> {
    fn drop(&mut self) {
        self.handle.release_owner(None, false);
    }
}

impl HandleInner {
    fn new(
        pool: Arc<PoolShared>,
        wrapper: Arc<BufferWrapper>,
        mode: AccessMode,
        window: Window,
        cursor: Cursor,
        tag: &str,
    ) -> Self {
        pool.counters.handle_created();
        Self {
            id: pool.ids.next_id(),
            pool,
            wrapper,
            mode,
            window,
            cursor: Mutex::new(cursor),
            owners: AtomicUsize::new(1),
            tags: Mutex::new(vec![Tag::from(tag)]),
        }
    }

    #[inline]
    pub(crate) fn is_freed(&self) -> bool {
        self.owners.load(Ordering::Acquire) == 0
    }

    /// Escalate if the handle has been released
    #[inline]
    pub(crate) fn ensure_live(&self) {
        if self.is_freed() {
            self.pool.fatal(self.use_after_free());
        }
    }

    fn tags(&self) -> Vec<Tag> {
        self.tags.lock().clone()
    }

    fn add_tag(&self, tag: &str) {
        self.tags.lock().push(Tag::from(tag));
    }

    fn remove_tag(&self, tag: &str) {
        let mut tags = self.tags.lock();
        match tags.iter().position(|t| t.as_str() == tag) {
            Some(index) => {
                tags.swap_remove(index);
            }
            None => debug!(handle = self.id, tag, "Discard with a tag this handle never carried"),
        }
    }

    fn use_after_free(&self) -> PoolError {
        PoolError::UseAfterFree {
            handle: self.id,
            wrapper: self.wrapper.id(),
            capacity: self.wrapper.capacity(),
            tags: self.tags(),
            allocated: self.pool.counters.allocated_bytes(),
        }
    }

    fn double_free(&self, tag: &str) -> PoolError {
        PoolError::DoubleFree {
            handle: self.id,
            wrapper: self.wrapper.id(),
            capacity: self.wrapper.capacity(),
            tag: Tag::from(tag),
            tags: self.tags(),
            allocated: self.pool.counters.allocated_bytes(),
        }
    }

    /// Add one owner, returning the new owner count
    fn acquire_owner(&self) -> usize {
        match self
            .owners
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n > 0).then_some(n + 1)
            }) {
            Ok(previous) => previous + 1,
            Err(_) => self.pool.fatal(self.use_after_free()),
        }
    }

    fn pin(&self) -> OwnerPin<'_> {
        self.acquire_owner();
        OwnerPin { handle: self }
    }

    /// Drop one owner; the caller that frees the handle releases its view
    fn release_owner(&self, tag: Option<&str>, logging: bool) {
        let previous = match self
            .owners
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(previous) => previous,
            Err(_) => self.pool.fatal(self.double_free(tag.unwrap_or_default())),
        };

        if let Some(tag) = tag {
            self.remove_tag(tag);
        }
        let tag = tag.unwrap_or("pin");
        let traced = self.pool.trace_enabled(logging);

        if previous > 1 {
            if traced {
                self.trace_event("Dereferenced", tag, self.wrapper.view_count(), previous - 1);
            }
            return;
        }

        self.pool.counters.handle_released();
        let views = self.wrapper.release_view();
        if traced {
            let event = if views == 0 { "Deallocated" } else { "Dereferenced" };
            self.trace_event(event, tag, views, 0);
        }

        let leftover = self.tags.lock().len();
        if leftover > 0 {
            debug!(handle = self.id, leftover, "Handle freed with unbalanced tags");
        }

        if views == 0 {
            self.pool.registry.give(Arc::clone(&self.wrapper));
        }
    }

    fn trace_event(&self, event: &str, tag: &str, views: usize, owners: usize) {
        trace!(
            handle = self.id,
            wrapper = self.wrapper.id(),
            capacity = self.wrapper.capacity(),
            views,
            owners,
            tags = ?self.tags(),
            allocated = self.pool.counters.allocated_bytes(),
            "{} {}",
            event,
            tag
        );
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        let owners = *self.owners.get_mut();
        if owners > 0 {
            self.pool.report_leak(LeakReport {
                handle: self.id,
                wrapper: self.wrapper.id(),
                capacity: self.wrapper.capacity(),
                owners,
                tags: std::mem::take(self.tags.get_mut()),
            });
        }
    }
}

impl SharedBuffer {
    /// Wrap checked-out storage in a handle whose limit is `limit`
    pub(crate) fn checked_out(
        pool: Arc<PoolShared>,
        wrapper: Arc<BufferWrapper>,
        limit: Size,
        tag: &str,
    ) -> Self {
        let window = Window {
            offset: 0,
            capacity: wrapper.capacity(),
        };
        let cursor = Cursor { position: 0, limit };
        Self {
            inner: Arc::new(HandleInner::new(
                pool,
                wrapper,
                AccessMode::ReadWrite,
                window,
                cursor,
                tag,
            )),
        }
    }

    pub(crate) fn trace_allocated(&self, tag: &str) {
        self.inner.trace_event("Allocated", tag, 1, 1);
    }

    fn derive(&self, tag: &str, slice: bool, requested: AccessMode) -> SharedBuffer {
        let source = &self.inner;
        let _pin = source.pin();

        let current = *source.cursor.lock();
        let (window, cursor) = if slice {
            let remaining = current.limit.saturating_sub(current.position);
            (
                Window {
                    offset: source.window.offset + current.position,
                    capacity: remaining,
                },
                Cursor {
                    position: 0,
                    limit: remaining,
                },
            )
        } else {
            (source.window, current)
        };

        let views = source.wrapper.acquire_view();
        let derived = SharedBuffer {
            inner: Arc::new(HandleInner::new(
                Arc::clone(&source.pool),
                Arc::clone(&source.wrapper),
                source.mode.narrow(requested),
                window,
                cursor,
                tag,
            )),
        };

        if source.pool.trace_enabled(true) {
            derived.inner.trace_event("Duplicated", tag, views, 1);
        }
        derived
    }

    /// New handle over the unread part (position..limit) of this view
    pub fn slice(&self, tag: &str) -> SharedBuffer {
        self.derive(tag, true, AccessMode::ReadWrite)
    }

    /// Read-only handle over the unread part of this view
    pub fn slice_read_only(&self, tag: &str) -> SharedBuffer {
        self.derive(tag, true, AccessMode::ReadOnly)
    }

    /// New handle with the same window and cursor values, moving independently
    pub fn duplicate(&self, tag: &str) -> SharedBuffer {
        self.derive(tag, false, AccessMode::ReadWrite)
    }

    /// Read-only handle with the same window and cursor values
    pub fn duplicate_read_only(&self, tag: &str) -> SharedBuffer {
        self.derive(tag, false, AccessMode::ReadOnly)
    }

    /// Register another owner of this same handle
    ///
    /// The returned value refers to the identical handle (shared cursor,
    /// shared owner count) and is the new owner's reference to it.
    pub fn implicit_reference(&self, tag: &str) -> SharedBuffer {
        let owners = self.inner.acquire_owner();
        self.inner.add_tag(tag);
        if self.inner.pool.trace_enabled(true) {
            self.inner
                .trace_event("Duplicated", tag, self.inner.wrapper.view_count(), owners);
        }
        SharedBuffer {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Give up one ownership of this handle
    pub fn discard(&self, tag: &str) {
        self.inner.release_owner(Some(tag), true);
    }

    /// [`discard`](Self::discard) without TRACE events
    pub fn discard_silent(&self, tag: &str) {
        self.inner.release_owner(Some(tag), false);
    }

    /// Read access to the window
    pub fn access(&self) -> BufferView<'_> {
        self.inner.ensure_live();
        BufferView::new(&self.inner)
    }

    /// Write access to the window
    ///
    /// Fails with [`PoolError::ReadOnly`] for read-only handles.
    pub fn access_mut(&self) -> PoolResult<BufferViewMut<'_>> {
        self.inner.ensure_live();
        match self.inner.mode {
            AccessMode::ReadWrite => Ok(BufferViewMut::new(&self.inner)),
            AccessMode::ReadOnly => Err(PoolError::ReadOnly {
                handle: self.inner.id,
            }),
        }
    }

    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    pub fn mode(&self) -> AccessMode {
        self.inner.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.mode == AccessMode::ReadOnly
    }

    /// Window capacity
    pub fn capacity(&self) -> Size {
        self.inner.window.capacity
    }

    /// Capacity of the backing bucket
    pub fn bucket_capacity(&self) -> Size {
        self.inner.wrapper.capacity()
    }

    pub fn wrapper_id(&self) -> WrapperId {
        self.inner.wrapper.id()
    }

    /// Live handles viewing the same storage (diagnostic snapshot)
    pub fn wrapper_view_count(&self) -> usize {
        self.inner.wrapper.view_count()
    }

    /// Owners of this handle; zero once released
    pub fn owner_count(&self) -> usize {
        self.inner.owners.load(Ordering::Acquire)
    }

    pub fn is_freed(&self) -> bool {
        self.inner.is_freed()
    }

    /// Tags of the current owners
    pub fn tags(&self) -> Vec<Tag> {
        self.inner.tags()
    }
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("id", &self.inner.id)
            .field("wrapper", &self.inner.wrapper)
            .field("mode", &self.inner.mode)
            .field("window", &self.inner.window)
            .field("cursor", &*self.inner.cursor.lock())
            .field("owners", &self.owner_count())
            .finish()
    }
}
