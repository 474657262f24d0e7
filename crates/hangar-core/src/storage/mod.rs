//! Blob storage for image artifacts.
//!
//! The pipeline addresses blobs by absolute path under a storage root (see
//! [`crate::paths::StorageLayout`]). Backends must tolerate concurrent writers
//! on distinct paths.

mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use std::path::Path;

use crate::error::StorageError;

/// Durable file storage consumed by the ingestion pipeline.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` to `path`, replacing any existing file.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Read the whole file at `path`.
    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Delete the file at `path`. Deleting a missing file succeeds.
    async fn delete(&self, path: &Path) -> Result<(), StorageError>;

    /// Whether a file exists at `path`.
    async fn exists(&self, path: &Path) -> bool;
}
