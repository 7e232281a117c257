//! Concrete sync sides for bucketdrive.
//!
//! Two implementations of the [`SyncSide`](bucketdrive_core::SyncSide)
//! contract:
//!
//! - [`LocalDirSide`]: a directory tree on the local filesystem
//! - [`ObjectStoreSide`]: a bucket behind an HTTP object-storage API
//!
//! Both produce slash-normalized relative paths, so their snapshots compare
//! key-for-key in the diff engine.

pub mod local;
pub mod object_store;

pub use local::LocalDirSide;
pub use object_store::{ObjectStoreConfig, ObjectStoreSide};
