//! Metadata store for photo records and their tags.

mod sqlite;

pub use sqlite::SqliteMetadataStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{NewPhoto, PersistedPhoto};

/// Durable photo records consumed by the ingestion pipeline.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert the photo and link every tag in one transaction.
    ///
    /// Tags are resolved get-or-create by name, so concurrent callers using the
    /// same name converge on one tag row. Either the photo and all its links
    /// exist afterwards, or nothing does.
    async fn create_photo_with_tags(
        &self,
        photo: &NewPhoto,
        tags: &[String],
    ) -> Result<i64, StoreError>;

    /// Fetch a photo with its tag names.
    async fn get_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError>;

    /// Delete a photo and its tag links, returning the removed record.
    async fn delete_photo(&self, id: i64) -> Result<PersistedPhoto, StoreError>;
}
