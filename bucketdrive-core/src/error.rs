//! Error types shared across the bucketdrive crates.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while syncing.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local storage error (filesystem walk, read, write, remove).
    #[error("storage error: {0}")]
    Storage(String),

    /// Remote transport error (listing, get, put, delete).
    #[error("network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Clock calibration could not complete.
    #[error("calibration failed: {0}")]
    Calibration(String),

    /// The two sides' clocks disagree beyond the configured tolerance.
    /// Last-writer-wins comparisons are unsafe; the process must not
    /// enter the sync loop.
    #[error("clock skew of {skew_ms}ms exceeds tolerance of {tolerance_ms}ms")]
    ClockSkew { skew_ms: i64, tolerance_ms: i64 },
}
