//! Process-local checkpoint storage.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::store::{CheckpointStore, StateMap};

/// In-memory implementation of CheckpointStore trait.
///
/// Clones share the same map, so a test can hand one clone to the code under
/// test and inspect the other. A store marked unreachable behaves like a
/// backend that is down: loads return an empty map and saves fail.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<StateMap>>,
    unreachable: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-existing entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::default();
        if let Ok(mut map) = store.entries.lock() {
            map.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        }
        store
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Copy of what is currently stored.
    pub fn snapshot(&self) -> StateMap {
        self.entries.lock().map(|map| map.clone()).unwrap_or_default()
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn save_state(&self, state: &StateMap) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            anyhow::bail!("memory store is unreachable");
        }
        let mut map = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        map.extend(state.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn retrieve_state(&self) -> Result<StateMap> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Ok(StateMap::new());
        }
        Ok(self.snapshot())
    }
}
