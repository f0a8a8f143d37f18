/*!
 * Buffer Pool
 *
 * Power-of-two buckets of heap storage handed out through reference-counted
 * [`SharedBuffer`] handles. Storage returns to its bucket when the last view
 * over it is discarded and is only handed back to the allocator when an
 * allocation fails and the arena is drained.
 */

mod allocator;
mod arena;
mod builder;
mod config;
mod diagnostics;
mod fatal;
mod handle;
mod sizing;
mod storage;
pub mod traits;
pub mod types;
mod view;
mod wrapper;

pub use builder::BufferPoolBuilder;
pub use config::PoolConfig;
pub use fatal::{AbortOnFatal, PanicOnFatal};
pub use handle::SharedBuffer;
pub use sizing::next_pow2;
pub use storage::{LimitedStorage, SystemStorage};
pub use traits::{FatalHandler, PoolDiagnostics, StorageAllocator};
pub use types::{AccessMode, BucketStats, LeakReport, PoolStats};
pub use view::{BufferView, BufferViewMut};

use crate::core::errors::PoolError;
use crate::core::types::IdSource;
use arena::ArenaRegistry;
use diagnostics::PoolCounters;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Level;

/// State shared by a pool and every handle it issued
pub(crate) struct PoolShared {
    pub(crate) config: PoolConfig,
    pub(crate) registry: ArenaRegistry,
    pub(crate) storage: Arc<dyn StorageAllocator>,
    pub(crate) fatal_handler: Arc<dyn FatalHandler>,
    pub(crate) ids: IdSource,
    pub(crate) wrapper_ids: IdSource,
    pub(crate) counters: PoolCounters,
    pub(crate) leaks: Mutex<Vec<LeakReport>>,
}

impl PoolShared {
    #[inline]
    pub(crate) fn fatal(&self, error: PoolError) -> ! {
        fatal::escalate(self.fatal_handler.as_ref(), error)
    }

    /// Whether a TRACE event for this operation should be built at all
    #[inline]
    pub(crate) fn trace_enabled(&self, logging: bool) -> bool {
        logging && self.config.trace_allocations && tracing::enabled!(Level::TRACE)
    }
}

/// Thread-safe pool of power-of-two buffers
///
/// Cheap to clone; clones share buckets, counters and configuration.
#[derive(Clone)]
pub struct BufferPool {
    shared: Arc<PoolShared>,
}

impl BufferPool {
    /// Pool with [`PoolConfig::from_env`], system storage and abort-on-fatal
    pub fn new() -> Self {
        BufferPoolBuilder::new().with_config(PoolConfig::from_env()).build()
    }

    pub fn builder() -> BufferPoolBuilder {
        BufferPoolBuilder::new()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.shared.config
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("config", &self.shared.config)
            .field("allocated_bytes", &self.shared.counters.allocated_bytes())
            .finish()
    }
}
