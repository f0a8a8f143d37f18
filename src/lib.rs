/*!
 * Heap Buffer Pool Library
 * Pooled power-of-two heap buffers with shared, reference-counted handles
 */

pub mod core;
pub mod invocation;
pub mod monitoring;
pub mod pool;

// Re-exports
pub use crate::core::errors::{PoolError, PoolResult, StorageError};
pub use crate::core::types::{HandleId, Size, Tag, WrapperId};
pub use crate::core::ShardManager;
pub use invocation::SerializedParams;
pub use monitoring::init_tracing;
pub use pool::{
    next_pow2, AbortOnFatal, AccessMode, BucketStats, BufferPool, BufferPoolBuilder, BufferView,
    BufferViewMut, FatalHandler, LeakReport, LimitedStorage, PanicOnFatal, PoolConfig,
    PoolDiagnostics, PoolStats, SharedBuffer, StorageAllocator, SystemStorage,
};
