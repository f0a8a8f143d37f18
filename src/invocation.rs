/*!
 * Serialized Invocation Parameters
 *
 * Holds the still-serialized parameter block of a request buffer without
 * copying it. Readers get read-only duplicates so concurrent consumers never
 * share a cursor.
 */

use crate::core::types::{Size, Tag};
use crate::pool::SharedBuffer;

/// Parameter block borrowed from a pooled request buffer
///
/// Owns one reference to a read-only handle. The consumer-level
/// [`implicit_reference`](Self::implicit_reference) and
/// [`discard`](Self::discard) are no-ops; the held reference is released by
/// [`close`](Self::close).
#[derive(Debug)]
pub struct SerializedParams {
    params: SharedBuffer,
    size: Size,
    tag: Tag,
}

impl SerializedParams {
    /// Borrow the unread part of `request` (position..limit)
    ///
    /// The request keeps its own ownership; the parameters hold a separate
    /// read-only slice of the same storage.
    pub fn from_remaining(request: &SharedBuffer, tag: &str) -> Self {
        Self::adopt(request.slice_read_only(tag), tag)
    }

    /// Take over an already-sliced parameter buffer
    ///
    /// The buffer must be positioned at its start.
    pub fn adopt(params: SharedBuffer, tag: &str) -> Self {
        let size = {
            let view = params.access();
            debug_assert_eq!(view.position(), 0, "parameters must start at position 0");
            view.limit()
        };
        Self {
            params,
            size,
            tag: Tag::from(tag),
        }
    }

    /// Serialized size in bytes
    pub fn size(&self) -> Size {
        self.size
    }

    /// Read-only duplicate of the parameter block
    ///
    /// Each caller gets an independent cursor and must discard the
    /// duplicate with the same tag.
    pub fn params(&self, tag: &str) -> SharedBuffer {
        self.params.duplicate_read_only(tag)
    }

    /// Parameter bytes copied out of the pool
    pub fn to_vec(&self) -> Vec<u8> {
        let params = self.params(self.tag.as_str());
        let bytes = params.access().to_vec();
        params.discard_silent(self.tag.as_str());
        bytes
    }

    /// Second consumer over the same parameter handle
    pub fn shallow_copy(&self) -> Self {
        Self {
            params: self.params.implicit_reference(self.tag.as_str()),
            size: self.size,
            tag: self.tag.clone(),
        }
    }

    /// No-op: the consumer itself is not reference counted
    pub fn implicit_reference(&self) {}

    /// No-op: see [`close`](Self::close)
    pub fn discard(&self) {}

    /// Release this consumer's reference to the parameter block
    pub fn close(self) {
        self.params.discard(self.tag.as_str());
    }
}
