//! The bucketdrive reconciliation engine.
//!
//! Two pieces, both backend-agnostic over [`SyncSide`](bucketdrive_core::SyncSide):
//!
//! - [`calibrate`]: one-shot startup check that the two sides' clocks agree
//!   within tolerance. Last-writer-wins comparisons are only safe after it
//!   passes; any calibration failure must terminate the process.
//! - [`Reconciler`]: the polling loop. Each cycle prunes empty local
//!   directories, lists both sides, applies deletions strictly before
//!   content sync, transfers one file at a time, and persists the new
//!   last-known snapshots.
//!
//! One cycle runs to completion (or aborts) before the next begins; the
//! reconciler owns all mutable state, so nothing here needs a lock.

mod calibrate;
mod reconciler;

pub use calibrate::{calibrate, CALIBRATION_KEY};
pub use reconciler::{Reconciler, SyncConfig, TickSummary, LOCAL_SNAPSHOT_KEY, REMOTE_SNAPSHOT_KEY};
