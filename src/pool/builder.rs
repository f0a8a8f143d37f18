/*!
 * Buffer Pool Builder
 * Builder pattern for BufferPool construction
 */

use super::arena::ArenaRegistry;
use super::diagnostics::PoolCounters;
use super::fatal::AbortOnFatal;
use super::storage::SystemStorage;
use super::traits::{FatalHandler, StorageAllocator};
use super::{BufferPool, PoolConfig, PoolShared};
use crate::core::types::IdSource;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Builder for [`BufferPool`]
pub struct BufferPoolBuilder {
    config: PoolConfig,
    storage: Option<Arc<dyn StorageAllocator>>,
    fatal_handler: Option<Arc<dyn FatalHandler>>,
}

impl BufferPoolBuilder {
    pub fn new() -> Self {
        Self {
            config: PoolConfig::default(),
            storage: None,
            fatal_handler: None,
        }
    }

    pub fn with_config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Source bucket storage from `storage` instead of the global allocator
    pub fn with_storage(mut self, storage: Arc<dyn StorageAllocator>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replace the abort-on-fatal policy
    pub fn with_fatal_handler(mut self, handler: Arc<dyn FatalHandler>) -> Self {
        self.fatal_handler = Some(handler);
        self
    }

    pub fn build(self) -> BufferPool {
        let mut features = Vec::new();
        if self.storage.is_some() {
            features.push("custom-storage");
        }
        if self.fatal_handler.is_some() {
            features.push("custom-fatal-handler");
        }
        if self.config.trace_allocations {
            features.push("allocation-tracing");
        }
        if self.config.leak_detection {
            features.push("leak-detection");
        }

        info!(
            shards = self.config.shard_amount,
            "Buffer pool initialized{}{}",
            if features.is_empty() { "" } else { " with " },
            features.join(", ")
        );

        BufferPool {
            shared: Arc::new(PoolShared {
                registry: ArenaRegistry::with_shard_amount(self.config.shard_amount),
                storage: self.storage.unwrap_or_else(|| Arc::new(SystemStorage)),
                fatal_handler: self.fatal_handler.unwrap_or_else(|| Arc::new(AbortOnFatal)),
                ids: IdSource::new(),
                wrapper_ids: IdSource::new(),
                counters: PoolCounters::new(),
                leaks: Mutex::new(Vec::new()),
                config: self.config,
            }),
        }
    }
}

impl Default for BufferPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
