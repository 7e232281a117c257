//! The reconciliation loop.
//!
//! Per cycle: prune empty local directories, list both sides, resolve
//! deletions, resolve content sync, persist snapshots, sleep. Deletions
//! strictly precede content sync — when a pass applies any deletion, the
//! cycle restarts from fresh listings so a concurrently removed file is
//! never re-uploaded or re-downloaded in the same pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use bucketdrive_core::{diff, Snapshot, SnapshotStore, SyncResult, SyncSide};

/// Snapshot-store key for the local side's last-known state.
pub const LOCAL_SNAPSHOT_KEY: &str = "local";
/// Snapshot-store key for the remote side's last-known state.
pub const REMOTE_SNAPSHOT_KEY: &str = "remote";

/// Policy knobs for the reconciliation loop.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between reconciliation cycles.
    pub poll_interval: Duration,
    /// Maximum tolerated clock difference between the sides.
    pub clock_tolerance_ms: i64,
    /// Minimum age of an empty local directory before it is pruned.
    pub gc_debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3500),
            clock_tolerance_ms: 60_000,
            gc_debounce: Duration::from_secs(60),
        }
    }
}

/// What a single cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Files deleted from the remote side (they vanished locally).
    pub remote_deletes: usize,
    /// Files deleted from the local side (they vanished remotely).
    pub local_deletes: usize,
    /// Files copied local -> remote.
    pub uploads: usize,
    /// Files copied remote -> local.
    pub downloads: usize,
}

impl TickSummary {
    /// True when the cycle performed no sync action.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// The reconciliation loop. Owns the two sides, the snapshot store, and the
/// last-known snapshot of each side — the only mutable state in the system.
pub struct Reconciler {
    local: Arc<dyn SyncSide>,
    remote: Arc<dyn SyncSide>,
    store: SnapshotStore,
    config: SyncConfig,
    last_local: Snapshot,
    last_remote: Snapshot,
}

impl Reconciler {
    /// Creates a reconciler, loading the last-known snapshots from `store`.
    /// Missing or unreadable prior state degrades to an empty baseline,
    /// which disables deletion detection until the first successful save.
    pub async fn new(
        local: Arc<dyn SyncSide>,
        remote: Arc<dyn SyncSide>,
        store: SnapshotStore,
        config: SyncConfig,
    ) -> Self {
        let last_local = store.load(LOCAL_SNAPSHOT_KEY).await;
        let last_remote = store.load(REMOTE_SNAPSHOT_KEY).await;

        Self {
            local,
            remote,
            store,
            config,
            last_local,
            last_remote,
        }
    }

    /// Runs the loop until the process terminates.
    pub async fn run(&mut self) {
        loop {
            match self.tick().await {
                Ok(summary) if summary.is_noop() => debug!("cycle complete, nothing to do"),
                Ok(summary) => info!(
                    "cycle complete: {} up, {} down, {} deleted remotely, {} deleted locally",
                    summary.uploads, summary.downloads, summary.remote_deletes, summary.local_deletes
                ),
                // Recoverable: no state was mutated, retry from scratch.
                Err(e) => warn!("cycle aborted: {e}"),
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// Runs one reconciliation cycle.
    ///
    /// An error means a listing failed and the cycle performed no sync
    /// action; individual transfer and persistence failures are logged and
    /// skipped instead.
    pub async fn tick(&mut self) -> SyncResult<TickSummary> {
        if let Err(e) = self.local.prune_empty_dirs(self.config.gc_debounce).await {
            warn!("directory pruning failed: {e}");
        }

        let mut summary = TickSummary::default();

        // Deletion passes repeat from fresh listings until a pass finds
        // nothing to delete; only then is content sync safe.
        let (current_local, current_remote) = loop {
            let current_remote = self.remote.list().await?;
            let current_local = self.local.list().await?;

            let mut deleted = false;

            // A side with no baseline contributes no deletions: an empty
            // last-known snapshot means "never observed", not "everything
            // was removed".
            if !self.last_local.is_empty() {
                let gone = diff::missing_only(&self.last_local, &current_local);
                if !gone.is_empty() {
                    info!("{} file(s) vanished locally, deleting remotely", gone.len());
                    for path in &gone {
                        match self.remote.remove(path).await {
                            Ok(()) => summary.remote_deletes += 1,
                            Err(e) => warn!("failed to delete {path} remotely: {e}"),
                        }
                    }
                    self.last_local = current_local.clone();
                    deleted = true;
                }
            }

            if !self.last_remote.is_empty() {
                let gone = diff::missing_only(&self.last_remote, &current_remote);
                if !gone.is_empty() {
                    info!("{} file(s) vanished remotely, deleting locally", gone.len());
                    for path in &gone {
                        match self.local.remove(path).await {
                            Ok(()) => summary.local_deletes += 1,
                            Err(e) => warn!("failed to delete {path} locally: {e}"),
                        }
                    }
                    self.last_remote = current_remote.clone();
                    deleted = true;
                }
            }

            if !deleted {
                break (current_local, current_remote);
            }
        };

        let uploads = diff::to_upload(&current_local, &current_remote);
        let downloads = diff::to_download(&current_remote, &current_local);

        for path in &uploads {
            match copy_file(self.local.as_ref(), self.remote.as_ref(), path).await {
                Ok(()) => {
                    info!("uploaded {path}");
                    summary.uploads += 1;
                }
                Err(e) => warn!("failed to upload {path}: {e}"),
            }
        }
        for path in &downloads {
            match copy_file(self.remote.as_ref(), self.local.as_ref(), path).await {
                Ok(()) => {
                    info!("downloaded {path}");
                    summary.downloads += 1;
                }
                Err(e) => warn!("failed to download {path}: {e}"),
            }
        }

        // The listings become the new baselines even when a transfer above
        // failed: a failed item resurfaces only once fresh listings expose
        // the diff again. Persistence failures keep the in-memory state
        // authoritative for this process.
        self.last_local = current_local;
        self.last_remote = current_remote;
        if let Err(e) = self.store.save(LOCAL_SNAPSHOT_KEY, &self.last_local).await {
            warn!("failed to persist local snapshot: {e}");
        }
        if let Err(e) = self.store.save(REMOTE_SNAPSHOT_KEY, &self.last_remote).await {
            warn!("failed to persist remote snapshot: {e}");
        }

        Ok(summary)
    }
}

async fn copy_file(from: &dyn SyncSide, to: &dyn SyncSide, path: &str) -> SyncResult<()> {
    let content = from.read(path).await?;
    to.write(path, &content).await
}
