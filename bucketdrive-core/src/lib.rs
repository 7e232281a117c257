//! Core reconciliation types for bucketdrive.
//!
//! bucketdrive keeps a local directory tree and a remote object-store bucket
//! in bidirectional agreement. This crate holds everything the engine and
//! the concrete backends share:
//!
//! - **Snapshot**: a path-to-metadata mapping describing one side's tree at
//!   a point in time
//! - **Diff**: pure functions that turn two snapshots into deletion and
//!   transfer sets
//! - **SyncSide**: the capability contract both backends implement, so the
//!   engine stays backend-agnostic and testable with in-memory fakes
//! - **SnapshotStore**: durable storage for the last-known snapshot of each
//!   side between process restarts
//!
//! Change detection is metadata-only by design: file size is compared, and
//! the strictly newer modification timestamp decides transfer direction.
//! There is no content hashing and no merge of concurrent edits.

pub mod diff;
mod error;
pub mod side;
pub mod snapshot;
pub mod snapshot_store;

pub use error::{SyncError, SyncResult};
pub use side::SyncSide;
pub use snapshot::{FileRecord, Snapshot};
pub use snapshot_store::SnapshotStore;
