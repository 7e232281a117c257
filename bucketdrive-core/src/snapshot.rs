//! Point-in-time view of one side's file tree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for a single file on one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File size in bytes.
    pub size: u64,
    /// Last modified time, milliseconds since the Unix epoch (UTC).
    pub modified_utc_ms: i64,
    /// Content checksum as reported by the side, if any. Currently only the
    /// remote side fills this in, and nothing compares it; carried for
    /// forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// A snapshot of one side's tree: slash-normalized relative path to record.
///
/// Paths are case-sensitive and never include directory entries. Both sides
/// produce the same canonical separator, so snapshots from the local tree
/// and the remote bucket compare key-for-key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    files: HashMap<String, FileRecord>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files in the snapshot.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the snapshot holds no files. An empty last-known snapshot
    /// means "no deletion baseline".
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Looks up a file by its relative path.
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// True if the snapshot contains `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Adds or replaces a file record.
    pub fn insert(&mut self, path: impl Into<String>, record: FileRecord) {
        self.files.insert(path.into(), record);
    }

    /// Iterates over all paths.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.files.iter().map(|(p, r)| (p.as_str(), r))
    }
}

impl FromIterator<(String, FileRecord)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, FileRecord)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
