/*!
 * Pool Configuration
 *
 * Runtime switches for allocation tracing, leak detection and registry
 * sharding, with environment overrides.
 */

use crate::core::limits::{ENV_LEAK_DETECTION, ENV_SHARDS, ENV_TRACE_ALLOCATIONS};
use crate::core::ShardManager;
use tracing::warn;

/// Buffer pool configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Emit TRACE events for allocations, derivations and discards
    pub trace_allocations: bool,
    /// Record handles dropped without their final discard
    pub leak_detection: bool,
    /// Shard amount of the arena registry map (power of two)
    pub shard_amount: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            trace_allocations: true,
            leak_detection: cfg!(debug_assertions),
            shard_amount: ShardManager::arena_shards(),
        }
    }
}

impl PoolConfig {
    /// Configuration for hot production paths
    pub fn production() -> Self {
        Self {
            trace_allocations: false,
            leak_detection: false,
            ..Default::default()
        }
    }

    /// Configuration for tests: every leak is recorded
    pub fn diagnostic() -> Self {
        Self {
            trace_allocations: true,
            leak_detection: true,
            ..Default::default()
        }
    }

    /// Defaults overridden by `HBB_POOL_TRACE`, `HBB_POOL_LEAK_DETECTION`
    /// and `HBB_POOL_SHARDS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(value) = env_flag(ENV_TRACE_ALLOCATIONS) {
            config.trace_allocations = value;
        }
        if let Some(value) = env_flag(ENV_LEAK_DETECTION) {
            config.leak_detection = value;
        }
        if let Ok(raw) = std::env::var(ENV_SHARDS) {
            match raw.trim().parse::<usize>() {
                Ok(shards) => config.shard_amount = ShardManager::normalize(shards),
                Err(e) => warn!(var = ENV_SHARDS, value = %raw, error = %e, "Ignoring invalid shard override"),
            }
        }

        config
    }

    pub fn with_trace_allocations(mut self, enabled: bool) -> Self {
        self.trace_allocations = enabled;
        self
    }

    pub fn with_leak_detection(mut self, enabled: bool) -> Self {
        self.leak_detection = enabled;
        self
    }

    pub fn with_shard_amount(mut self, shards: usize) -> Self {
        self.shard_amount = ShardManager::normalize(shards);
        self
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    match parse_flag(&raw) {
        Some(value) => Some(value),
        None => {
            warn!(var = name, value = %raw, "Ignoring invalid boolean override");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
