/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{HandleId, Size, Tag, WrapperId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

/// Buffer pool errors
///
/// The first three variants describe memory-safety violations or systemic
/// exhaustion and are never returned to callers; they are handed to the
/// fatal escalation path. `LeakedHandle` is logged and recorded only. The
/// remaining variants are ordinary view errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PoolError {
    #[error("use after free of handle #{handle} (wrapper #{wrapper}, capacity {capacity}, tags {tags:?}, {allocated} bytes allocated)")]
    #[diagnostic(
        code(pool::use_after_free),
        help("Every owner must stop touching a handle once it has discarded it.")
    )]
    UseAfterFree {
        handle: HandleId,
        wrapper: WrapperId,
        capacity: Size,
        tags: Vec<Tag>,
        allocated: Size,
    },

    #[error("double free of handle #{handle} (wrapper #{wrapper}, capacity {capacity}, discard tag {tag:?}, remaining tags {tags:?}, {allocated} bytes allocated)")]
    #[diagnostic(
        code(pool::double_free),
        help("Each allocation, slice, duplicate and implicit reference is balanced by exactly one discard.")
    )]
    DoubleFree {
        handle: HandleId,
        wrapper: WrapperId,
        capacity: Size,
        tag: Tag,
        tags: Vec<Tag>,
        allocated: Size,
    },

    #[error("pool exhausted: could not allocate {bucket} bytes for a {requested} byte request after reclaiming {reclaimed} idle bytes ({allocated} bytes allocated)")]
    #[diagnostic(
        code(pool::exhausted),
        help("All idle buffers were released and the retry still failed; the process is out of memory.")
    )]
    PoolExhaustion {
        requested: Size,
        bucket: Size,
        reclaimed: Size,
        allocated: Size,
    },

    #[error("handle #{handle} (wrapper #{wrapper}, capacity {capacity}) dropped with {owners} undiscarded owner(s), tags {tags:?}")]
    #[diagnostic(
        code(pool::leaked_handle),
        help("A handle went out of scope without its final discard; its storage never returns to the arena.")
    )]
    LeakedHandle {
        handle: HandleId,
        wrapper: WrapperId,
        capacity: Size,
        owners: usize,
        tags: Vec<Tag>,
    },

    #[error("handle #{handle} is read-only")]
    #[diagnostic(
        code(pool::read_only),
        help("Obtain a writable slice or duplicate instead of a read-only one.")
    )]
    ReadOnly { handle: HandleId },

    #[error("buffer overflow: {requested} bytes requested, {remaining} remaining")]
    #[diagnostic(code(pool::overflow))]
    BufferOverflow { requested: Size, remaining: Size },

    #[error("buffer underflow: {requested} bytes requested, {remaining} remaining")]
    #[diagnostic(code(pool::underflow))]
    BufferUnderflow { requested: Size, remaining: Size },

    #[error("position {position} exceeds limit {limit}")]
    #[diagnostic(code(pool::position_out_of_bounds))]
    PositionOutOfBounds { position: Size, limit: Size },

    #[error("limit {limit} exceeds capacity {capacity}")]
    #[diagnostic(code(pool::limit_out_of_bounds))]
    LimitOutOfBounds { limit: Size, capacity: Size },
}

impl PoolError {
    /// Whether this error must go through fatal escalation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PoolError::UseAfterFree { .. }
                | PoolError::DoubleFree { .. }
                | PoolError::PoolExhaustion { .. }
        )
    }
}

/// Failure reported by a storage allocator
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage exhausted: could not reserve {capacity} bytes")]
    Exhausted { capacity: Size },
}
