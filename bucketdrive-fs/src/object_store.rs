//! Remote object-store side.
//!
//! Talks to a bucket-scoped HTTP object-storage API:
//!
//! - `GET    /v1/buckets/{bucket}` — bucket metadata (404 when absent)
//! - `POST   /v1/buckets` — create a bucket, JSON body `{"name": ...}`
//! - `GET    /v1/buckets/{bucket}/objects?limit=N[&start=cursor]` — paginated
//!   listing returning object name, size, `timeModified` (RFC 3339) and md5
//! - `GET/PUT/DELETE /v1/buckets/{bucket}/objects/{name}` — object content
//!
//! Object names keep forward slashes as-is in snapshots and are URL-encoded
//! on the wire. Every request carries a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bucketdrive_core::{FileRecord, Snapshot, SyncError, SyncResult, SyncSide};

/// Configuration for the object-store side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Base URL of the object storage API, e.g. `https://objects.example.com`.
    pub api_base_url: String,
    /// Bucket holding the synced tree.
    pub bucket: String,
    /// Bearer token sent with every request.
    pub access_token: String,
    /// Page size for listing requests.
    pub list_page_size: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            bucket: String::new(),
            access_token: String::new(),
            list_page_size: 1000,
            timeout_secs: 60,
        }
    }
}

/// Listing response structures.
#[derive(Debug, Deserialize)]
struct ObjectList {
    objects: Vec<ObjectSummary>,
    #[serde(rename = "nextStartWith")]
    next_start_with: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectSummary {
    name: String,
    size: u64,
    #[serde(rename = "timeModified")]
    time_modified: Option<String>,
    md5: Option<String>,
}

/// A bucket behind the HTTP object-storage API.
pub struct ObjectStoreSide {
    config: ObjectStoreConfig,
    client: Client,
}

impl ObjectStoreSide {
    /// Creates a new object-store side.
    pub fn new(config: ObjectStoreConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to create HTTP client");

        Self { config, client }
    }

    fn bucket_url(&self) -> String {
        format!(
            "{}/v1/buckets/{}",
            self.config.api_base_url, self.config.bucket
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/objects/{}", self.bucket_url(), urlencoding::encode(path))
    }

    /// Checks that the bucket exists, creating it when it does not.
    pub async fn find_or_create_bucket(&self) -> SyncResult<()> {
        let response = self
            .client
            .get(self.bucket_url())
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("bucket lookup failed: {e}")))?;

        if response.status().is_success() {
            return Ok(());
        }
        if response.status().as_u16() != 404 {
            let error = response.text().await.unwrap_or_default();
            return Err(SyncError::Network(format!("bucket lookup failed: {error}")));
        }

        let body = serde_json::json!({ "name": self.config.bucket });
        let response = self
            .client
            .post(format!("{}/v1/buckets", self.config.api_base_url))
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("bucket creation failed: {e}")))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(SyncError::Network(format!("bucket creation failed: {error}")));
        }

        info!("created bucket {}", self.config.bucket);
        Ok(())
    }

    fn summary_to_record(summary: ObjectSummary) -> (String, FileRecord) {
        let modified_utc_ms = summary
            .time_modified
            .as_deref()
            .and_then(|t| chrono::DateTime::parse_from_rfc3339(t).ok())
            .map(|dt| dt.timestamp_millis())
            .unwrap_or(0);

        (
            summary.name,
            FileRecord {
                size: summary.size,
                modified_utc_ms,
                digest: summary.md5,
            },
        )
    }
}

#[async_trait]
impl SyncSide for ObjectStoreSide {
    fn side_name(&self) -> &'static str {
        "remote"
    }

    async fn list(&self) -> SyncResult<Snapshot> {
        let mut snapshot = Snapshot::new();
        let mut start: Option<String> = None;
        let page_size = self.config.list_page_size.to_string();

        loop {
            let mut request = self
                .client
                .get(format!("{}/objects", self.bucket_url()))
                .bearer_auth(&self.config.access_token)
                .query(&[("limit", page_size.as_str())]);

            if let Some(cursor) = &start {
                request = request.query(&[("start", cursor.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| SyncError::Network(format!("object listing failed: {e}")))?;

            if !response.status().is_success() {
                let error = response.text().await.unwrap_or_default();
                return Err(SyncError::Network(format!("object listing failed: {error}")));
            }

            let page: ObjectList = response
                .json()
                .await
                .map_err(|e| SyncError::Network(format!("failed to parse object listing: {e}")))?;

            for summary in page.objects {
                let (name, record) = Self::summary_to_record(summary);
                snapshot.insert(name, record);
            }

            match page.next_start_with {
                Some(cursor) => start = Some(cursor),
                None => break,
            }
        }

        Ok(snapshot)
    }

    async fn read(&self, path: &str) -> SyncResult<Vec<u8>> {
        debug!("downloading {path}");

        let response = self
            .client
            .get(self.object_url(path))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("download of {path} failed: {e}")))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(SyncError::Network(format!("download of {path} failed: {error}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SyncError::Network(format!("reading body of {path} failed: {e}")))?;

        Ok(bytes.to_vec())
    }

    async fn write(&self, path: &str, content: &[u8]) -> SyncResult<()> {
        debug!("uploading {path} ({} bytes)", content.len());

        let response = self
            .client
            .put(self.object_url(path))
            .bearer_auth(&self.config.access_token)
            .header("Content-Type", "application/octet-stream")
            .body(content.to_vec())
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("upload of {path} failed: {e}")))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(SyncError::Network(format!("upload of {path} failed: {error}")));
        }

        Ok(())
    }

    async fn remove(&self, path: &str) -> SyncResult<()> {
        debug!("deleting {path}");

        let response = self
            .client
            .delete(self.object_url(path))
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| SyncError::Network(format!("delete of {path} failed: {e}")))?;

        // Deleting a missing object is fine.
        if !response.status().is_success() && response.status().as_u16() != 404 {
            let error = response.text().await.unwrap_or_default();
            return Err(SyncError::Network(format!("delete of {path} failed: {error}")));
        }

        Ok(())
    }
}
