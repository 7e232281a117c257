//! Pure comparison functions over two snapshots.
//!
//! These functions have no side effects and no I/O; the reconciler feeds
//! them listings and applies the resulting sets.
//!
//! Change detection is size-only: two records with equal size are treated as
//! equal content, whatever their timestamps say. When sizes differ, the side
//! with the strictly newer modification time wins. Equal timestamps with
//! differing sizes transfer nothing — the conflict stays unresolved until a
//! later cycle observes a strict ordering.

use std::collections::BTreeSet;

use crate::snapshot::{FileRecord, Snapshot};

fn meta_differs(a: &FileRecord, b: &FileRecord) -> bool {
    a.size != b.size
}

fn source_wins(src: &FileRecord, dst: &FileRecord) -> bool {
    meta_differs(src, dst) && src.modified_utc_ms > dst.modified_utc_ms
}

/// Paths present in `last_known` and absent from `current`.
///
/// Absence from a fresh listing is the sole deletion signal; there is no
/// tombstone or deletion log. Used symmetrically on both sides.
pub fn missing_only(last_known: &Snapshot, current: &Snapshot) -> BTreeSet<String> {
    last_known
        .paths()
        .filter(|p| !current.contains(p))
        .map(str::to_owned)
        .collect()
}

/// Paths that should be copied from the local tree to the remote bucket:
/// absent remotely, or present on both sides with differing size and a
/// strictly newer local modification time.
pub fn to_upload(local: &Snapshot, remote: &Snapshot) -> BTreeSet<String> {
    local
        .iter()
        .filter(|(path, record)| match remote.get(path) {
            None => true,
            Some(remote_record) => source_wins(record, remote_record),
        })
        .map(|(path, _)| path.to_owned())
        .collect()
}

/// Paths that should be copied from the remote bucket to the local tree.
/// Symmetric to [`to_upload`] with the sides reversed.
pub fn to_download(remote: &Snapshot, local: &Snapshot) -> BTreeSet<String> {
    remote
        .iter()
        .filter(|(path, record)| match local.get(path) {
            None => true,
            Some(local_record) => source_wins(record, local_record),
        })
        .map(|(path, _)| path.to_owned())
        .collect()
}
