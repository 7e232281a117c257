//! Local directory tree side.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use bucketdrive_core::{FileRecord, Snapshot, SyncError, SyncResult, SyncSide};

/// A directory tree on the local filesystem.
///
/// Relative paths crossing the [`SyncSide`] boundary use forward slashes;
/// translation to the platform separator happens here.
pub struct LocalDirSide {
    root: PathBuf,
}

impl LocalDirSide {
    /// Creates a side rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> SyncResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to create sync root: {e}")))?;
        Ok(())
    }

    /// Resolves a slash-normalized relative path below the root.
    fn full_path(&self, rel: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in rel.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// Converts an absolute path below the root back to the canonical
    /// slash-normalized form.
    fn to_relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let segments: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if segments.is_empty() {
            return None;
        }
        Some(segments.join("/"))
    }

    /// Walks the tree and collects every directory below the root.
    async fn collect_dirs(&self) -> SyncResult<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut read_dir = fs::read_dir(&dir)
                .await
                .map_err(|e| SyncError::Storage(format!("failed to read {}: {e}", dir.display())))?;
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| SyncError::Storage(format!("failed to read directory entry: {e}")))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| SyncError::Storage(format!("failed to stat entry: {e}")))?;
                if file_type.is_dir() {
                    dirs.push(entry.path());
                    pending.push(entry.path());
                }
            }
        }

        Ok(dirs)
    }
}

fn system_time_to_millis(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_millis() as i64,
        // Pre-epoch mtimes, negative millis.
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

#[async_trait]
impl SyncSide for LocalDirSide {
    fn side_name(&self) -> &'static str {
        "local"
    }

    async fn list(&self) -> SyncResult<Snapshot> {
        let mut snapshot = Snapshot::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut read_dir = fs::read_dir(&dir)
                .await
                .map_err(|e| SyncError::Storage(format!("failed to read {}: {e}", dir.display())))?;

            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| SyncError::Storage(format!("failed to read directory entry: {e}")))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| SyncError::Storage(format!("failed to stat entry: {e}")))?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }
                let Some(rel) = self.to_relative(&path) else {
                    continue;
                };

                let metadata = entry
                    .metadata()
                    .await
                    .map_err(|e| SyncError::Storage(format!("failed to stat {rel}: {e}")))?;
                let modified = metadata
                    .modified()
                    .map_err(|e| SyncError::Storage(format!("no mtime for {rel}: {e}")))?;

                snapshot.insert(
                    rel,
                    FileRecord {
                        size: metadata.len(),
                        modified_utc_ms: system_time_to_millis(modified),
                        digest: None,
                    },
                );
            }
        }

        Ok(snapshot)
    }

    async fn read(&self, path: &str) -> SyncResult<Vec<u8>> {
        fs::read(self.full_path(path))
            .await
            .map_err(|e| SyncError::Storage(format!("failed to read {path}: {e}")))
    }

    async fn write(&self, path: &str, content: &[u8]) -> SyncResult<()> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::Storage(format!("failed to create parent of {path}: {e}")))?;
        }
        fs::write(&full, content)
            .await
            .map_err(|e| SyncError::Storage(format!("failed to write {path}: {e}")))?;
        debug!("wrote {path} ({} bytes)", content.len());
        Ok(())
    }

    async fn remove(&self, path: &str) -> SyncResult<()> {
        match fs::remove_file(self.full_path(path)).await {
            Ok(()) => {
                debug!("removed {path}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Storage(format!("failed to remove {path}: {e}"))),
        }
    }

    /// Removes empty directories whose mtime is older than `debounce`.
    ///
    /// The age check guards against deleting a directory another process is
    /// still populating. A directory emptied by this pass may leave its
    /// parent empty; the parent is picked up by a later cycle.
    async fn prune_empty_dirs(&self, debounce: Duration) -> SyncResult<()> {
        let now = SystemTime::now();

        for dir in self.collect_dirs().await? {
            let mut read_dir = match fs::read_dir(&dir).await {
                Ok(rd) => rd,
                Err(e) => {
                    warn!("skipping {}: {e}", dir.display());
                    continue;
                }
            };
            match read_dir.next_entry().await {
                Ok(Some(_)) => continue, // not empty
                Ok(None) => {}
                Err(e) => {
                    warn!("skipping {}: {e}", dir.display());
                    continue;
                }
            }

            let modified = match fs::metadata(&dir).await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("skipping {}: {e}", dir.display());
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age < debounce {
                continue;
            }

            match fs::remove_dir(&dir).await {
                Ok(()) => debug!("removed empty directory {}", dir.display()),
                Err(e) => warn!("failed to remove {}: {e}", dir.display()),
            }
        }

        Ok(())
    }
}
