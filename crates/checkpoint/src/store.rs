//! Checkpoint storage trait and types
//!
//! Stores deal in whole mappings: the state layer above them always loads
//! everything at startup and writes everything back on change.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

/// Flat string-to-string state, ordered for stable serialization.
pub type StateMap = BTreeMap<String, String>;

/// Trait for state storage operations.
///
/// Implementations:
/// - Redis (`RedisStore`)
/// - Filesystem storage (`FilesystemStore`)
/// - Process memory (`MemoryStore`)
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist every entry of `state`, overwriting same-named keys.
    async fn save_state(&self, state: &StateMap) -> Result<()>;

    /// Load all stored entries.
    ///
    /// An empty map is returned when nothing was stored yet, and also when
    /// the backend cannot be reached at all.
    async fn retrieve_state(&self) -> Result<StateMap>;
}
