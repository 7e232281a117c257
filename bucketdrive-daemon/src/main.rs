//! Bucketdrive sync daemon.
//!
//! Keeps a local directory tree and an object-storage bucket in sync:
//!
//! 1. Ensure the local directory and the remote bucket exist
//! 2. Calibrate the two sides' clocks (fatal on disagreement)
//! 3. Poll forever, reconciling deletions and content changes each cycle
//!
//! Usage:
//!   bucketdrive --local-dir ~/Drive --api-url https://objects.example.com \
//!               --bucket my-drive --drive-id my-drive
//!
//! Every flag can also come from a BUCKETDRIVE_* environment variable.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use bucketdrive_core::SnapshotStore;
use bucketdrive_fs::{LocalDirSide, ObjectStoreConfig, ObjectStoreSide};
use bucketdrive_sync::{calibrate, Reconciler, SyncConfig};

#[derive(Parser, Debug)]
#[command(name = "bucketdrive")]
#[command(about = "Bidirectional sync between a local directory and an object-storage bucket")]
struct Args {
    /// Local directory to sync
    #[arg(long, env = "BUCKETDRIVE_LOCAL_DIR")]
    local_dir: PathBuf,

    /// Base URL of the object storage API
    #[arg(long, env = "BUCKETDRIVE_API_URL")]
    api_url: String,

    /// Bucket holding the synced tree
    #[arg(long, env = "BUCKETDRIVE_BUCKET")]
    bucket: String,

    /// Bearer token for the object storage API
    #[arg(long, env = "BUCKETDRIVE_TOKEN", hide_env_values = true)]
    token: String,

    /// Identifier for this drive's persisted state under ~/.bucketdrive/
    #[arg(long, env = "BUCKETDRIVE_DRIVE_ID")]
    drive_id: String,

    /// Delay between reconciliation cycles, in milliseconds
    #[arg(long, default_value = "3500")]
    poll_interval_ms: u64,

    /// Maximum tolerated clock skew between the sides, in milliseconds
    #[arg(long, default_value = "60000")]
    clock_tolerance_ms: i64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("bucketdrive starting...");

    let local = LocalDirSide::new(&args.local_dir);
    local
        .ensure_root()
        .await
        .with_context(|| format!("failed to prepare local directory {:?}", args.local_dir))?;

    let remote = ObjectStoreSide::new(ObjectStoreConfig {
        api_base_url: args.api_url.clone(),
        bucket: args.bucket.clone(),
        access_token: args.token.clone(),
        ..ObjectStoreConfig::default()
    });
    remote
        .find_or_create_bucket()
        .await
        .with_context(|| format!("failed to prepare bucket {}", args.bucket))?;

    // Last-writer-wins is only safe when both sides agree on the time.
    let skew_ms = calibrate(&local, &remote, args.clock_tolerance_ms)
        .await
        .context("clock calibration failed; refusing to sync")?;
    info!("clocks calibrated, skew {skew_ms} ms");

    let store = SnapshotStore::new(state_dir(&args.drive_id)?);

    let config = SyncConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        clock_tolerance_ms: args.clock_tolerance_ms,
        ..SyncConfig::default()
    };

    info!(
        "syncing {:?} <-> bucket {} every {} ms",
        args.local_dir, args.bucket, args.poll_interval_ms
    );

    let mut reconciler =
        Reconciler::new(Arc::new(local), Arc::new(remote), store, config).await;
    reconciler.run().await;

    Ok(())
}

/// Per-drive state directory: `$HOME/.bucketdrive/<drive_id>`.
fn state_dir(drive_id: &str) -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".bucketdrive").join(drive_id))
}
