//! Hangar Core - ingestion pipeline for aviation photo uploads.
//!
//! Hangar takes an uploaded image (plus an optional camera RAW sidecar),
//! checks that it is what it claims to be, extracts EXIF metadata, normalizes
//! orientation and size, renders a fixed set of thumbnails and records the
//! result. A failed upload leaves nothing behind.
//!
//! # Architecture
//!
//! ```text
//! Upload → Validate → Stage → Sniff → EXIF → Transform → RAW copy → Persist
//!                                                                  ↘ on failure: delete artifacts
//! ```
//!
//! Storage is injected: the pipeline talks to a [`BlobStore`] for files and a
//! [`MetadataStore`] for records. [`Hangar`] wires up the local filesystem and
//! SQLite implementations from a [`Config`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use hangar_core::{Config, Hangar, UploadFile, UploadRequest};
//!
//! #[tokio::main]
//! async fn main() -> hangar_core::Result<()> {
//!     let hangar = Hangar::new(Config::load()?).await?;
//!
//!     let file = UploadFile::new("concorde.jpg", std::fs::read("concorde.jpg")?);
//!     let mut request = UploadRequest::new(1, file, "Concorde at LHR");
//!     request.tags = "concorde, lhr".to_string();
//!
//!     let photo = hangar.ingest(request).await?;
//!     println!("Stored photo {}", photo.photo_id);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod paths;
pub mod pipeline;
pub mod storage;
pub mod store;
pub mod types;

use std::sync::Arc;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, HangarError, IngestError, IngestResult, Result, StorageError, StoreError,
    TransformError, TransformStage, ValidationError,
};
pub use paths::{thumbnail_url, StorageLayout};
pub use pipeline::{ImageTransformer, Ingestor, MetadataExtractor, Validator};
pub use storage::{BlobStore, LocalBlobStore};
pub use store::{MetadataStore, SqliteMetadataStore};
pub use types::{
    ExtractedMetadata, FileClass, IngestedPhoto, NewPhoto, PersistedPhoto, ProcessedImageSet,
    ReviewStatus, UploadFile, UploadRequest,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hangar pipeline backed by local storage and SQLite - the main entry point.
pub struct Hangar {
    config: Config,
    store: Arc<SqliteMetadataStore>,
    ingestor: Ingestor,
}

impl Hangar {
    /// Open the stores named in `config` and build the pipeline.
    pub async fn new(config: Config) -> Result<Self> {
        tracing::debug!("Initializing Hangar v{}", VERSION);

        let store = Arc::new(
            SqliteMetadataStore::connect(&config.database_path(), &config.database).await?,
        );
        let blobs = Arc::new(LocalBlobStore::new(config.storage_root()).await?);
        let ingestor = Ingestor::new(&config, store.clone(), blobs);

        Ok(Self {
            config,
            store,
            ingestor,
        })
    }

    /// Create a Hangar instance from the default configuration file.
    pub async fn with_defaults() -> Result<Self> {
        let config = Config::load()?;
        Self::new(config).await
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ingestor(&self) -> &Ingestor {
        &self.ingestor
    }

    pub fn store(&self) -> &SqliteMetadataStore {
        &self.store
    }

    /// Run one upload through the pipeline.
    pub async fn ingest(&self, request: UploadRequest) -> Result<IngestedPhoto> {
        Ok(self.ingestor.ingest(request).await?)
    }

    /// Fetch a stored photo.
    pub async fn photo(&self, id: i64) -> Result<PersistedPhoto> {
        Ok(self.store.get_photo(id).await?)
    }

    /// Delete a photo and its files.
    pub async fn remove(&self, id: i64) -> Result<PersistedPhoto> {
        Ok(self.ingestor.remove(id).await?)
    }
}
