#![allow(dead_code)]

pub mod fixtures;
pub mod stores;

use hangar_core::config::{Config, ThumbnailSpec};
use hangar_core::{Ingestor, LocalBlobStore, SqliteMetadataStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Storage root, database and pipeline living in one temp directory.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config: Config,
    pub store: Arc<SqliteMetadataStore>,
    pub blobs: Arc<LocalBlobStore>,
}

impl TestEnv {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let config = test_config(temp_dir.path());
        let store = Arc::new(
            SqliteMetadataStore::connect(&config.database_path(), &config.database)
                .await
                .expect("Failed to open test database"),
        );
        let blobs = Arc::new(
            LocalBlobStore::new(config.storage_root())
                .await
                .expect("Failed to create storage root"),
        );
        Self {
            temp_dir,
            config,
            store,
            blobs,
        }
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(&self.config, self.store.clone(), self.blobs.clone())
    }

    pub fn root(&self) -> PathBuf {
        self.config.storage_root()
    }

    /// Every regular file under the storage root.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        files_under(&self.root())
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar(sql)
            .fetch_one(self.store.pool())
            .await
            .expect("count query")
    }
}

/// Small renditions so tests stay fast.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.root = dir.join("media");
    config.database.path = dir.join("hangar.db");
    config.processing.max_dimension = 200;
    config.processing.thumbnails = vec![
        ThumbnailSpec::new("sm", 30, 20, 80),
        ThumbnailSpec::new("md", 80, 53, 85),
        ThumbnailSpec::new("lg", 160, 107, 90),
    ];
    config
}

pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files.sort();
    files
}
