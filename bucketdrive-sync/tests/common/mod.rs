#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use bucketdrive_core::{FileRecord, Snapshot, SyncError, SyncResult, SyncSide};

/// In-memory [`SyncSide`] with a manually set clock and injectable failures.
pub struct MemorySide {
    name: &'static str,
    files: RwLock<HashMap<String, (FileRecord, Vec<u8>)>>,
    /// Timestamp stamped onto the next writes, milliseconds since epoch.
    clock_ms: AtomicI64,
    fail_list: AtomicBool,
    fail_write: AtomicBool,
    /// Path hidden from listings (simulates a broken listing path).
    hide_in_list: RwLock<Option<String>>,
    prune_calls: AtomicUsize,
}

impl MemorySide {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            files: RwLock::new(HashMap::new()),
            clock_ms: AtomicI64::new(0),
            fail_list: AtomicBool::new(false),
            fail_write: AtomicBool::new(false),
            hide_in_list: RwLock::new(None),
            prune_calls: AtomicUsize::new(0),
        }
    }

    /// Sets the timestamp stamped onto subsequent writes.
    pub fn set_clock(&self, ms: i64) {
        self.clock_ms.store(ms, Ordering::SeqCst);
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::SeqCst);
    }

    pub async fn set_hide_in_list(&self, path: Option<&str>) {
        *self.hide_in_list.write().await = path.map(str::to_owned);
    }

    /// Seeds a file with an explicit record, bypassing the clock.
    pub async fn seed(&self, path: &str, size: u64, modified_utc_ms: i64, content: &[u8]) {
        let record = FileRecord {
            size,
            modified_utc_ms,
            digest: None,
        };
        self.files
            .write()
            .await
            .insert(path.to_string(), (record, content.to_vec()));
    }

    /// Removes a file directly, as an external actor would.
    pub async fn drop_file(&self, path: &str) {
        self.files.write().await.remove(path);
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.files.read().await.contains_key(path)
    }

    pub async fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(path).map(|(_, c)| c.clone())
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub fn prune_calls(&self) -> usize {
        self.prune_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncSide for MemorySide {
    fn side_name(&self) -> &'static str {
        self.name
    }

    async fn list(&self) -> SyncResult<Snapshot> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(SyncError::Storage(format!(
                "injected listing failure on {}",
                self.name
            )));
        }

        let hidden = self.hide_in_list.read().await.clone();
        let mut snapshot = Snapshot::new();
        for (path, (record, _)) in self.files.read().await.iter() {
            if hidden.as_deref() == Some(path.as_str()) {
                continue;
            }
            snapshot.insert(path.clone(), record.clone());
        }
        Ok(snapshot)
    }

    async fn read(&self, path: &str) -> SyncResult<Vec<u8>> {
        self.files
            .read()
            .await
            .get(path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| SyncError::Storage(format!("{path} not found on {}", self.name)))
    }

    async fn write(&self, path: &str, content: &[u8]) -> SyncResult<()> {
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(SyncError::Storage(format!(
                "injected write failure on {}",
                self.name
            )));
        }

        let record = FileRecord {
            size: content.len() as u64,
            modified_utc_ms: self.clock_ms.load(Ordering::SeqCst),
            digest: None,
        };
        self.files
            .write()
            .await
            .insert(path.to_string(), (record, content.to_vec()));
        Ok(())
    }

    async fn remove(&self, path: &str) -> SyncResult<()> {
        self.files.write().await.remove(path);
        Ok(())
    }

    async fn prune_empty_dirs(&self, _debounce: Duration) -> SyncResult<()> {
        self.prune_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
