//! Durable storage for the last-known snapshot of each side.
//!
//! One JSON file per key under a state directory. Loading never fails the
//! process: a missing, unreadable, or corrupt file degrades to an empty
//! snapshot, which disables deletion detection for that side until the next
//! successful save — a fail-safe bias against spurious mass deletion.

use std::path::PathBuf;

use tokio::fs;
use tracing::warn;

use crate::error::{SyncError, SyncResult};
use crate::snapshot::Snapshot;

/// Persists and loads snapshots as flat JSON maps keyed by relative path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at `dir`. The directory is created on the
    /// first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Loads the snapshot stored under `key`.
    ///
    /// Any failure is logged and treated as "no prior state".
    pub async fn load(&self, key: &str) -> Snapshot {
        let path = self.file_path(key);
        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("no prior snapshot for {key} ({}): {e}", path.display());
                return Snapshot::new();
            }
        };
        match serde_json::from_slice(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("unreadable snapshot for {key} ({}): {e}", path.display());
                Snapshot::new()
            }
        }
    }

    /// Saves `snapshot` under `key`, replacing any previous state wholesale.
    pub async fn save(&self, key: &str, snapshot: &Snapshot) -> SyncResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to create state dir: {e}")))?;

        let content = serde_json::to_vec(snapshot)?;
        fs::write(self.file_path(key), content)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to write snapshot {key}: {e}")))?;
        Ok(())
    }
}
