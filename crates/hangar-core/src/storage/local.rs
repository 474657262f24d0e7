//! Local filesystem blob store.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::BlobStore;
use crate::error::StorageError;

/// Stores blobs as plain files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|source| StorageError::Write {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Refuse paths that are not strictly below the root.
    fn check(&self, path: &Path) -> Result<(), StorageError> {
        let inside = path
            .strip_prefix(&self.root)
            .ok()
            .filter(|rest| !rest.as_os_str().is_empty())
            .is_some_and(|rest| rest.components().all(|c| matches!(c, Component::Normal(_))));
        if inside {
            Ok(())
        } else {
            Err(StorageError::InvalidPath(path.to_path_buf()))
        }
    }

    async fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.check(path)?;
        Self::ensure_parent_dir(path).await?;

        let start = Instant::now();
        let write_err = |source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::File::create(path).await.map_err(write_err)?;
        file.write_all(data).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Wrote blob"
        );
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.check(path)?;
        fs::read(path).await.map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        self.check(path)?;
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        if self.check(path).is_err() {
            return false;
        }
        fs::try_exists(path).await.unwrap_or(false)
    }
}
