//! Capability contract for one side of the sync pair.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::SyncResult;
use crate::snapshot::Snapshot;

/// One side of the sync pair: the local directory tree or the remote bucket.
///
/// Paths crossing this boundary are relative and slash-normalized. A side
/// that stores them differently (platform separators, URL encoding)
/// translates here, never in the diff engine.
#[async_trait]
pub trait SyncSide: Send + Sync {
    /// Short name used in log lines.
    fn side_name(&self) -> &'static str;

    /// Lists every file currently on this side.
    async fn list(&self) -> SyncResult<Snapshot>;

    /// Reads the full content of a file.
    async fn read(&self, path: &str) -> SyncResult<Vec<u8>>;

    /// Writes (creates or replaces) a file, creating intermediate
    /// directories where the backend has them.
    async fn write(&self, path: &str, content: &[u8]) -> SyncResult<()>;

    /// Removes a file. Removing a file that does not exist succeeds.
    async fn remove(&self, path: &str) -> SyncResult<()>;

    /// Removes empty directories whose last modification is older than
    /// `debounce`. Sides without directory structure keep this no-op.
    async fn prune_empty_dirs(&self, debounce: Duration) -> SyncResult<()> {
        let _ = debounce;
        Ok(())
    }
}
