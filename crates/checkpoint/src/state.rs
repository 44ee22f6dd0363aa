//! In-memory mirror over a checkpoint store.

use anyhow::{Context, Result};
use tracing::debug;

use crate::store::{CheckpointStore, StateMap};
use crate::Checkpoint;

/// Durable key/value state.
///
/// The mirror is populated once at load time and is authoritative for reads
/// afterwards. Every `set` writes the complete mirror back to the store, so
/// the store holds a superset of what any single caller changed.
pub struct State<S: CheckpointStore> {
    store: S,
    local: StateMap,
}

impl<S: CheckpointStore> State<S> {
    /// Populate the mirror from the store.
    pub async fn load(store: S) -> Result<Self> {
        let local = store
            .retrieve_state()
            .await
            .context("Failed to load sync state")?;
        debug!("Loaded {} state entries", local.len());
        Ok(Self { store, local })
    }

    /// Update one entry and persist the whole mirror.
    ///
    /// The mirror is updated even when the write fails; the next successful
    /// `set` carries the value over.
    pub async fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        debug!("Setting state '{key}' = '{value}'");
        self.local.insert(key, value);
        self.store
            .save_state(&self.local)
            .await
            .context("Failed to persist sync state")
    }

    /// Read from the mirror only.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.local.get(key).map(String::as_str)
    }

    /// Read and parse a typed checkpoint entry.
    ///
    /// Returns `Ok(None)` when the key is absent and an error when the stored
    /// text does not parse.
    pub fn get_checkpoint<C: Checkpoint>(&self, key: &str) -> Result<Option<C>> {
        self.get(key)
            .map(|raw| {
                C::from_cli_string(raw)
                    .with_context(|| format!("Stored {} under '{key}' is unreadable", C::KIND))
            })
            .transpose()
    }

    pub async fn set_checkpoint<C: Checkpoint>(&mut self, key: &str, checkpoint: &C) -> Result<()> {
        self.set(key, checkpoint.to_cli_string()).await
    }

    pub fn entries(&self) -> &StateMap {
        &self.local
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
