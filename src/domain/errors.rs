//! Domain error types
//!
//! This module defines the error hierarchy for Toggl Ledger.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Toggl Ledger error type
///
/// This is the primary error type used throughout the application.
/// Every variant aborts a sync run. A record that cannot be interpreted is
/// not an error here; it travels as a [`RecordIssue`] in the run summary.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote time-report source errors
    #[error("Source unavailable: {0}")]
    Source(#[from] SourceError),

    /// Storage engine errors
    #[error("Storage unavailable: {0}")]
    Storage(#[from] StorageError),

    /// Log rotation errors
    #[error("Rotation failure: {0}")]
    Rotation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl SyncError {
    /// Whether the failure is transient and worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Source(err) => err.is_retryable(),
            SyncError::Storage(err) => err.is_retryable(),
            SyncError::Io(_) => true,
            _ => false,
        }
    }
}

/// Remote time-report source errors
///
/// Errors that occur when talking to the Toggl Reports API.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to reach the reporting API
    #[error("Failed to connect to report source: {0}")]
    ConnectionFailed(String),

    /// Credentials were rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Server error (5xx, or 429 throttling)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The source answered but returned no records
    #[error("No data fetched: {0}")]
    NoDataFetched(String),
}

impl SourceError {
    /// Whether the failure is transient
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SourceError::ConnectionFailed(_)
                | SourceError::Timeout(_)
                | SourceError::ServerError { .. }
        )
    }
}

/// Storage engine errors
///
/// Errors raised by a [`SheetBackend`](crate::adapters::sheet::SheetBackend)
/// implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The container (directory) cannot be reached
    #[error("Container unavailable: {0}")]
    ContainerUnavailable(String),

    /// No file with the requested name
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// The file exists but lacks the requested sheet
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// A file with the target name already exists
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// Reading a file failed
    #[error("Failed to read: {0}")]
    ReadFailed(String),

    /// Writing a file failed
    #[error("Failed to write: {0}")]
    WriteFailed(String),

    /// A row/column address outside the addressable area
    #[error("Invalid range: {0}")]
    InvalidRange(String),
}

impl StorageError {
    /// Whether the failure is transient
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StorageError::ContainerUnavailable(_)
                | StorageError::ReadFailed(_)
                | StorageError::WriteFailed(_)
        )
    }
}

/// A record skipped because it could not be interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIssue {
    /// Identifier of the offending record
    pub record_id: u64,

    /// What was wrong with it
    pub reason: String,
}

impl RecordIssue {
    /// Creates a new record issue
    pub fn new(record_id: u64, reason: impl Into<String>) -> Self {
        Self {
            record_id,
            reason: reason.into(),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_source_error_conversion() {
        let source_err = SourceError::NoDataFetched("empty".to_string());
        let sync_err: SyncError = source_err.into();
        assert!(matches!(sync_err, SyncError::Source(_)));
        assert!(sync_err.to_string().starts_with("Source unavailable"));
    }

    #[test]
    fn test_storage_error_conversion() {
        let storage_err = StorageError::FileNotFound("schedule_latest".to_string());
        let sync_err: SyncError = storage_err.into();
        assert!(matches!(sync_err, SyncError::Storage(_)));
    }

    #[test]
    fn test_retry_classification() {
        assert!(SyncError::from(SourceError::Timeout("30s".to_string())).is_retryable());
        assert!(SyncError::from(SourceError::ServerError {
            status: 503,
            message: "unavailable".to_string()
        })
        .is_retryable());
        assert!(!SyncError::from(SourceError::AuthenticationFailed("401".to_string()))
            .is_retryable());
        assert!(!SyncError::from(SourceError::NoDataFetched("none".to_string())).is_retryable());
        assert!(SyncError::from(StorageError::ReadFailed("locked".to_string())).is_retryable());
        assert!(!SyncError::from(StorageError::AlreadyExists("x".to_string())).is_retryable());
        assert!(!SyncError::Rotation("rename failed".to_string()).is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let sync_err: SyncError = io_err.into();
        assert!(matches!(sync_err, SyncError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let sync_err: SyncError = toml_err.into();
        assert!(matches!(sync_err, SyncError::Configuration(_)));
        assert!(sync_err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_sync_error_implements_std_error() {
        let err = SyncError::Rotation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
