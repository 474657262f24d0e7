//! Failure-injecting store doubles.

use async_trait::async_trait;
use hangar_core::{
    BlobStore, LocalBlobStore, MetadataStore, NewPhoto, PersistedPhoto, SqliteMetadataStore,
    StorageError, StoreError,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Notify;

/// Metadata store whose writes always fail.
pub struct FailingMetadataStore;

#[async_trait]
impl MetadataStore for FailingMetadataStore {
    async fn create_photo_with_tags(
        &self,
        _photo: &NewPhoto,
        _tags: &[String],
    ) -> Result<i64, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn get_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError> {
        Err(StoreError::NotFound(id))
    }

    async fn delete_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError> {
        Err(StoreError::NotFound(id))
    }
}

/// SQLite store whose creates wait for [`GatedMetadataStore::open`].
///
/// `entered` fires as soon as a create call arrives.
pub struct GatedMetadataStore {
    pub inner: Arc<SqliteMetadataStore>,
    pub entered: Arc<Notify>,
    gate: Arc<Notify>,
}

impl GatedMetadataStore {
    pub fn new(inner: Arc<SqliteMetadataStore>) -> Self {
        Self {
            inner,
            entered: Arc::new(Notify::new()),
            gate: Arc::new(Notify::new()),
        }
    }

    /// Let the waiting create proceed.
    pub fn open(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl MetadataStore for GatedMetadataStore {
    async fn create_photo_with_tags(
        &self,
        photo: &NewPhoto,
        tags: &[String],
    ) -> Result<i64, StoreError> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.inner.create_photo_with_tags(photo, tags).await
    }

    async fn get_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError> {
        self.inner.get_photo(id).await
    }

    async fn delete_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError> {
        self.inner.delete_photo(id).await
    }
}

/// Local blob store that refuses writes to paths containing `needle`.
pub struct FlakyBlobStore {
    pub inner: LocalBlobStore,
    pub needle: &'static str,
}

impl FlakyBlobStore {
    fn refuses(&self, path: &Path) -> bool {
        path.to_string_lossy().contains(self.needle)
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        if self.refuses(path) {
            // Leave a partial file behind, as an interrupted write would
            let _ = self.inner.write(path, &data[..data.len() / 2]).await;
            return Err(StorageError::Write {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.write(path, data).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.inner.read(path).await
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path).await
    }
}
