//! Checkpoint backend selected on the command line.

use anyhow::{Context, Result};
use async_trait::async_trait;
use checkpoint::{CheckpointStore, FilesystemStore, RedisStore, StateMap};

use crate::{StateBackend, StateOpts};

/// Either of the durable backends, dispatched at runtime.
pub enum ConfiguredStore {
    Redis(RedisStore),
    File(FilesystemStore),
}

impl ConfiguredStore {
    pub async fn open(opts: &StateOpts) -> Result<Self> {
        match opts.state_backend {
            StateBackend::Redis => {
                let store = RedisStore::connect(opts.into())
                    .await
                    .context("Failed to set up Redis client")?;
                Ok(Self::Redis(store))
            }
            StateBackend::File => Ok(Self::File(FilesystemStore::new(&opts.state_file))),
        }
    }
}

#[async_trait]
impl CheckpointStore for ConfiguredStore {
    async fn save_state(&self, state: &StateMap) -> Result<()> {
        match self {
            Self::Redis(store) => store.save_state(state).await,
            Self::File(store) => store.save_state(state).await,
        }
    }

    async fn retrieve_state(&self) -> Result<StateMap> {
        match self {
            Self::Redis(store) => store.retrieve_state().await,
            Self::File(store) => store.retrieve_state().await,
        }
    }
}
