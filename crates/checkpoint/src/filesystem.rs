//! Filesystem-based checkpoint storage implementation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::store::{CheckpointStore, StateMap};

/// Filesystem implementation of CheckpointStore trait.
///
/// Stores the whole mapping as one JSON object. Writes go to a sibling
/// temporary file that is then renamed over the target, so a crash mid-write
/// leaves the previous state intact.
pub struct FilesystemStore {
    path: PathBuf,
}

impl FilesystemStore {
    /// Create a new FilesystemStore backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FilesystemStore {
    async fn save_state(&self, state: &StateMap) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let temp = self.temp_path();
        std::fs::write(&temp, serde_json::to_string_pretty(state)?)
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        std::fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        tracing::debug!("Stored state to {}", self.path.display());
        Ok(())
    }

    async fn retrieve_state(&self) -> Result<StateMap> {
        if !self.path.exists() {
            return Ok(StateMap::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .with_context(|| format!("State file {} is not a JSON object of strings", self.path.display()))
    }
}
