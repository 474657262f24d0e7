//! Error types for the Hangar ingestion pipeline.
//!
//! Errors are organized by stage so callers can map each failure to a
//! distinct user-facing message: input errors carry a stable identity,
//! infrastructure errors carry the underlying cause.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Hangar operations.
#[derive(Error, Debug)]
pub enum HangarError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Ingestion failures
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Metadata store errors outside of an ingestion
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Blob store errors outside of an ingestion
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Client-fixable input errors. Nothing has been written when one of these
/// is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Declared size exceeds the configured maximum
    #[error("File too large: {file_name} ({size} bytes > {max} bytes)")]
    FileTooLarge { file_name: String, size: u64, max: u64 },

    /// Extension not in the allow-list, or content sniffed as a disallowed type
    #[error("Invalid file type for {file_name}: {extension}")]
    InvalidFileType { file_name: String, extension: String },

    /// File name tries to escape its directory
    #[error("Rejected file name: {0}")]
    PathTraversal(String),

    /// Header bytes do not match the signature for the claimed extension
    #[error("Content of {file_name} does not look like a .{extension} file")]
    MagicNumberMismatch { file_name: String, extension: String },

    /// Required request field absent or blank
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Request field longer than allowed
    #[error("Field {field} exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
}

/// Stage of the image transformer in which a failure happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformStage {
    Open,
    Rotate,
    Resize,
    EncodeMain,
    EncodeThumbnail(String),
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformStage::Open => write!(f, "open"),
            TransformStage::Rotate => write!(f, "rotate"),
            TransformStage::Resize => write!(f, "resize"),
            TransformStage::EncodeMain => write!(f, "encode-main"),
            TransformStage::EncodeThumbnail(name) => write!(f, "encode-thumbnail-{name}"),
        }
    }
}

/// Image transformation failure, tagged with the stage that failed.
#[derive(Error, Debug)]
#[error("Transform failed in {stage} stage: {message}")]
pub struct TransformError {
    pub stage: TransformStage,
    pub message: String,
}

impl TransformError {
    pub fn new(stage: TransformStage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Blob store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing a file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a file failed
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Deleting a file failed for a reason other than it being absent
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path resolves outside the storage root
    #[error("Path outside storage root: {0}")]
    InvalidPath(PathBuf),
}

/// Metadata store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No photo with the given id
    #[error("Photo not found: {0}")]
    NotFound(i64),

    /// The store call ended without reporting an outcome
    #[error("Store operation interrupted: {0}")]
    Interrupted(String),

    /// Failed to create the database directory
    #[error("Cannot prepare database location: {0}")]
    Setup(#[from] std::io::Error),
}

/// Failures of a single ingestion. None of these are fatal to the process.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Input rejected before anything was written
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Staging the upload to temporary storage failed
    #[error("Failed to stage upload: {0}")]
    Staging(#[source] StorageError),

    /// Image transformation failed; produced files have been removed
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Persisting the record failed; written artifacts have been removed
    #[error("Failed to persist photo: {0}")]
    Persist(#[source] StoreError),

    /// Lookup or removal of an existing photo failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience type alias for Hangar results.
pub type Result<T> = std::result::Result<T, HangarError>;

/// Convenience type alias for ingestion results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_stage_display() {
        assert_eq!(TransformStage::Open.to_string(), "open");
        assert_eq!(TransformStage::EncodeMain.to_string(), "encode-main");
        assert_eq!(
            TransformStage::EncodeThumbnail("md".to_string()).to_string(),
            "encode-thumbnail-md"
        );
    }

    #[test]
    fn test_validation_error_passes_through_ingest_error() {
        let err: IngestError = ValidationError::MissingField("title").into();
        assert_eq!(err.to_string(), "Missing required field: title");
        assert!(matches!(
            err,
            IngestError::Validation(ValidationError::MissingField("title"))
        ));
    }
}
