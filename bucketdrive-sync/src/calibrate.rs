//! Startup clock calibration between the two sides.
//!
//! Writes a sentinel file into the local tree, copies it to the remote, and
//! compares the modification timestamps both sides report for it. The sync
//! policy is last-writer-wins on wall-clock time, so a skew beyond tolerance
//! makes every conflict decision unreliable — the caller must treat any
//! error from here as fatal and not enter the loop.

use tracing::{info, warn};

use bucketdrive_core::{SyncError, SyncResult, SyncSide};

/// Name of the sentinel file written to both sides during calibration.
pub const CALIBRATION_KEY: &str = ".calibration";

const CALIBRATION_CONTENT: &[u8] = b"bucketdrive calibration probe";

/// Measures the clock difference between `local` and `remote`.
///
/// Returns the absolute skew in milliseconds when it is within
/// `tolerance_ms` (a skew exactly equal to the tolerance passes). The
/// sentinel is removed from both sides on success; removal failures are
/// logged, not fatal — a stale remote sentinel is a benign one-time sync
/// candidate.
pub async fn calibrate(
    local: &dyn SyncSide,
    remote: &dyn SyncSide,
    tolerance_ms: i64,
) -> SyncResult<i64> {
    info!("calibration begins");

    local.write(CALIBRATION_KEY, CALIBRATION_CONTENT).await?;

    // The timestamp must come from a fresh listing, not from the write
    // itself: the loop later compares listing-reported timestamps, so the
    // probe has to measure the same observation path.
    let local_listing = local.list().await?;
    // Missing here means the local listing itself is broken.
    let Some(local_record) = local_listing.get(CALIBRATION_KEY) else {
        return Err(SyncError::Calibration(
            "sentinel missing from local listing".to_string(),
        ));
    };
    let local_ms = local_record.modified_utc_ms;
    info!("local sentinel modified at {local_ms}");

    if let Err(e) = remote.write(CALIBRATION_KEY, CALIBRATION_CONTENT).await {
        remove_sentinel(local).await;
        return Err(e);
    }

    let remote_listing = match remote.list().await {
        Ok(listing) => listing,
        Err(e) => {
            remove_sentinel(local).await;
            return Err(e);
        }
    };
    let Some(remote_record) = remote_listing.get(CALIBRATION_KEY) else {
        remove_sentinel(local).await;
        return Err(SyncError::Calibration(
            "sentinel missing from remote listing".to_string(),
        ));
    };
    let remote_ms = remote_record.modified_utc_ms;
    info!("remote sentinel modified at {remote_ms}");

    let skew_ms = (remote_ms - local_ms).abs();
    if skew_ms > tolerance_ms {
        remove_sentinel(local).await;
        return Err(SyncError::ClockSkew {
            skew_ms,
            tolerance_ms,
        });
    }

    remove_sentinel(local).await;
    remove_sentinel(remote).await;

    info!("calibration passed, skew {skew_ms}ms (tolerance {tolerance_ms}ms)");
    Ok(skew_ms)
}

async fn remove_sentinel(side: &dyn SyncSide) {
    if let Err(e) = side.remove(CALIBRATION_KEY).await {
        warn!(
            "failed to remove sentinel from {} side: {e}",
            side.side_name()
        );
    }
}
