/*!
 * Byte Views
 *
 * Cursor-based access to a handle's window: relative `get`/`put` advance the
 * position, `read`/`write` expose `[0, limit)` of the window. Every call
 * checks the handle is still live.
 */

use super::handle::{Cursor, HandleInner};
use super::types::AccessMode;
use crate::core::errors::{PoolError, PoolResult};
use crate::core::types::Size;
use bytes::Bytes;
use parking_lot::MutexGuard;
use std::ops::{Deref, Range};

/// Read access to a handle's window
pub struct BufferView<'a> {
    handle: &'a HandleInner,
}

/// Write access to a handle's window
pub struct BufferViewMut<'a> {
    view: BufferView<'a>,
}

impl<'a> BufferView<'a> {
    pub(crate) fn new(handle: &'a HandleInner) -> Self {
        Self { handle }
    }

    #[inline]
    fn cursor(&self) -> MutexGuard<'a, Cursor> {
        self.handle.ensure_live();
        self.handle.cursor.lock()
    }

    #[inline]
    fn absolute(&self, range: Range<Size>) -> Range<Size> {
        let offset = self.handle.window.offset;
        offset + range.start..offset + range.end
    }

    pub fn position(&self) -> Size {
        self.cursor().position
    }

    pub fn limit(&self) -> Size {
        self.cursor().limit
    }

    pub fn capacity(&self) -> Size {
        self.handle.window.capacity
    }

    pub fn remaining(&self) -> Size {
        let cursor = self.cursor();
        cursor.limit - cursor.position
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    pub fn is_read_only(&self) -> bool {
        self.handle.mode == AccessMode::ReadOnly
    }

    pub fn set_position(&self, position: Size) -> PoolResult<()> {
        let mut cursor = self.cursor();
        if position > cursor.limit {
            return Err(PoolError::PositionOutOfBounds {
                position,
                limit: cursor.limit,
            });
        }
        cursor.position = position;
        Ok(())
    }

    /// Move the limit; a position past the new limit is pulled back to it
    pub fn set_limit(&self, limit: Size) -> PoolResult<()> {
        let capacity = self.capacity();
        let mut cursor = self.cursor();
        if limit > capacity {
            return Err(PoolError::LimitOutOfBounds { limit, capacity });
        }
        cursor.limit = limit;
        cursor.position = cursor.position.min(limit);
        Ok(())
    }

    /// Limit to the current position, position to zero
    pub fn flip(&self) {
        let mut cursor = self.cursor();
        cursor.limit = cursor.position;
        cursor.position = 0;
    }

    /// Position to zero, limit to capacity
    pub fn clear(&self) {
        let capacity = self.capacity();
        let mut cursor = self.cursor();
        cursor.position = 0;
        cursor.limit = capacity;
    }

    pub fn rewind(&self) {
        self.cursor().position = 0;
    }

    /// Copy `dst.len()` bytes from the position, advancing it
    pub fn get(&self, dst: &mut [u8]) -> PoolResult<()> {
        let mut cursor = self.cursor();
        let remaining = cursor.limit - cursor.position;
        if dst.len() > remaining {
            return Err(PoolError::BufferUnderflow {
                requested: dst.len(),
                remaining,
            });
        }
        let start = cursor.position;
        self.handle
            .wrapper
            .read(self.absolute(start..start + dst.len()), |src| {
                dst.copy_from_slice(src)
            });
        cursor.position += dst.len();
        Ok(())
    }

    pub fn get_u8(&self) -> PoolResult<u8> {
        let mut byte = [0u8; 1];
        self.get(&mut byte)?;
        Ok(byte[0])
    }

    /// Big-endian
    pub fn get_u32(&self) -> PoolResult<u32> {
        let mut bytes = [0u8; 4];
        self.get(&mut bytes)?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Big-endian
    pub fn get_u64(&self) -> PoolResult<u64> {
        let mut bytes = [0u8; 8];
        self.get(&mut bytes)?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Run `f` over `[0, limit)` of the window
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let limit = self.limit();
        self.handle.wrapper.read(self.absolute(0..limit), f)
    }

    /// Copy of the unread bytes (`position..limit`); the cursor is unchanged
    pub fn to_vec(&self) -> Vec<u8> {
        let cursor = self.cursor();
        self.handle
            .wrapper
            .read(self.absolute(cursor.position..cursor.limit), <[u8]>::to_vec)
    }

    /// Unread bytes as an owned [`Bytes`], detached from the pool
    pub fn copy_to_bytes(&self) -> Bytes {
        Bytes::from(self.to_vec())
    }
}

impl<'a> BufferViewMut<'a> {
    pub(crate) fn new(handle: &'a HandleInner) -> Self {
        Self {
            view: BufferView::new(handle),
        }
    }

    /// Copy `src` in at the position, advancing it
    pub fn put(&self, src: &[u8]) -> PoolResult<()> {
        let mut cursor = self.view.cursor();
        let remaining = cursor.limit - cursor.position;
        if src.len() > remaining {
            return Err(PoolError::BufferOverflow {
                requested: src.len(),
                remaining,
            });
        }
        let start = cursor.position;
        self.view
            .handle
            .wrapper
            .write(self.view.absolute(start..start + src.len()), |dst| {
                dst.copy_from_slice(src)
            });
        cursor.position += src.len();
        Ok(())
    }

    pub fn put_u8(&self, value: u8) -> PoolResult<()> {
        self.put(&[value])
    }

    /// Big-endian
    pub fn put_u32(&self, value: u32) -> PoolResult<()> {
        self.put(&value.to_be_bytes())
    }

    /// Big-endian
    pub fn put_u64(&self, value: u64) -> PoolResult<()> {
        self.put(&value.to_be_bytes())
    }

    /// Run `f` over `[0, limit)` of the window, mutably
    pub fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let limit = self.view.limit();
        self.view
            .handle
            .wrapper
            .write(self.view.absolute(0..limit), f)
    }
}

impl<'a> Deref for BufferViewMut<'a> {
    type Target = BufferView<'a>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}
