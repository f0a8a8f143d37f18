/*!
 * Core Types
 * Common types used across the buffer pool
 */

use std::sync::atomic::{AtomicU64, Ordering};

/// Size type for buffer capacities, positions and limits
pub type Size = usize;

/// Diagnostic tag attached to a handle by each of its owners
///
/// Tags are short free-form labels ("network-read", "sp-params", ...), so they
/// are stored inline where possible.
pub type Tag = smartstring::alias::String;

/// Identity of a storage wrapper, stable across checkout cycles
pub type WrapperId = u64;

/// Identity of a handle instance
pub type HandleId = u64;

/// Monotonic identity source for wrappers and handles
///
/// Identities only need to be unique within one process run; they stand in
/// for object identity in log lines and error reports.
#[derive(Debug)]
pub struct IdSource {
    next: AtomicU64,
}

impl IdSource {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdSource {
    fn default() -> Self {
        Self::new()
    }
}
