/*!
 * Core Module
 * Shared types, limits, errors and shard sizing
 */

pub mod errors;
pub mod limits;
pub mod shard_manager;
pub mod types;

pub use errors::*;
pub use shard_manager::ShardManager;
pub use types::*;
