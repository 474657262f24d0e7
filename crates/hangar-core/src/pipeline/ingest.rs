//! Ingestion orchestration: validate, stage, transform, persist.
//!
//! Filesystem writes happen first and the database write last. If anything
//! fails after the first write, every artifact of the upload is deleted
//! before the error is returned, so callers see all-or-nothing behavior
//! without a lock spanning both stores.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{IngestError, IngestResult, StoreError, ValidationError};
use crate::paths::{thumbnail_url, StorageLayout, UploadPaths};
use crate::storage::BlobStore;
use crate::store::MetadataStore;
use crate::types::{
    FileClass, IngestedPhoto, NewPhoto, PersistedPhoto, ReviewStatus, UploadRequest,
};

use super::metadata::MetadataExtractor;
use super::signature::{self, HEADER_LEN};
use super::transform::ImageTransformer;
use super::validate::Validator;

/// Runs uploads through the pipeline against injected stores.
pub struct Ingestor {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    layout: StorageLayout,
    validator: Validator,
    transformer: ImageTransformer,
}

impl Ingestor {
    /// Create an ingestor writing under `config.storage_root()`.
    pub fn new(
        config: &Config,
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            layout: StorageLayout::new(config.storage_root()),
            validator: Validator::new(config.limits.clone(), config.formats.clone()),
            transformer: ImageTransformer::new(config.processing.clone()),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Ingest one upload and return the new photo's id.
    ///
    /// The record is always created with [`ReviewStatus::Pending`].
    pub async fn ingest(&self, request: UploadRequest) -> IngestResult<IngestedPhoto> {
        let start = Instant::now();
        let (extension, raw_extension) = self.validate(&request)?;

        let logical_id = Uuid::new_v4().to_string();
        let paths = self.layout.upload_paths(
            &Utc::now(),
            &logical_id,
            &extension,
            raw_extension.as_deref(),
            &self.transformer.config().thumbnails,
        );

        let mut guard = ArtifactGuard::new(Arc::clone(&self.blobs));
        let result = self.run(&request, &paths, &mut guard).await;
        // On success only the temp file is still tracked
        guard.cleanup().await;

        match &result {
            Ok(photo) => tracing::info!(
                photo_id = photo.photo_id,
                logical_id = %photo.logical_id,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Ingested {}x{} photo",
                photo.width,
                photo.height
            ),
            Err(e) => tracing::warn!(logical_id = %logical_id, error = %e, "Ingestion failed"),
        }
        result
    }

    /// Delete a photo record, then its files.
    ///
    /// File deletion is best-effort once the record is gone; failures are
    /// logged.
    pub async fn remove(&self, photo_id: i64) -> IngestResult<PersistedPhoto> {
        let removed = self.metadata.delete_photo(photo_id).await?;

        let photo = &removed.photo;
        let mut files = vec![self.layout.resolve(&photo.file_path)];
        if let Some(base) = &photo.thumbnail_path {
            files.extend(
                self.transformer
                    .config()
                    .thumbnails
                    .iter()
                    .map(|spec| self.layout.resolve(&thumbnail_url(base, &spec.name))),
            );
        }
        if let Some(raw) = &photo.raw_file_path {
            files.push(self.layout.resolve(raw));
        }
        delete_all(self.blobs.as_ref(), &files).await;

        tracing::info!(photo_id, files = files.len(), "Removed photo");
        Ok(removed)
    }

    /// Request checks that run before anything is written.
    ///
    /// Returns the primary and RAW extensions.
    fn validate(&self, request: &UploadRequest) -> IngestResult<(String, Option<String>)> {
        self.validator.validate_title(&request.title)?;

        let file = &request.file;
        self.validator
            .validate(FileClass::Image, &file.file_name, file.size(), &file.data)?;
        let extension = Validator::extension(&file.file_name).unwrap_or_default();

        let raw_extension = match &request.raw_file {
            Some(raw) => {
                self.validator
                    .validate(FileClass::Raw, &raw.file_name, raw.size(), &raw.data)?;
                Validator::extension(&raw.file_name)
            }
            None => None,
        };

        Ok((extension, raw_extension))
    }

    async fn run(
        &self,
        request: &UploadRequest,
        paths: &UploadPaths,
        guard: &mut ArtifactGuard,
    ) -> IngestResult<IngestedPhoto> {
        let file = &request.file;

        // Stage
        guard.track(&paths.temp.absolute);
        self.blobs
            .write(&paths.temp.absolute, &file.data)
            .await
            .map_err(IngestError::Staging)?;
        let staged = self
            .blobs
            .read(&paths.temp.absolute)
            .await
            .map_err(IngestError::Staging)?;

        // Content must be one of the allowed image types, whatever the name says
        let header = &staged[..staged.len().min(HEADER_LEN)];
        let allowed = self.validator.allowed_extensions(FileClass::Image);
        let sniffed = signature::sniff(header, allowed).ok_or_else(|| {
            ValidationError::InvalidFileType {
                file_name: file.file_name.clone(),
                extension: Validator::extension(&file.file_name).unwrap_or_default(),
            }
        })?;
        tracing::trace!("  Sniffed {} as {}", file.file_name, sniffed);

        let metadata_start = Instant::now();
        let mut metadata = MetadataExtractor::extract(&staged);
        tracing::trace!("  Metadata: {:?}", metadata_start.elapsed());

        for artifact in paths.artifacts() {
            guard.track(&artifact.absolute);
        }
        let processed = self
            .transformer
            .process(staged, metadata.orientation, paths, self.blobs.as_ref())
            .await?;

        let raw_file_path = match (&request.raw_file, &paths.raw) {
            (Some(raw), Some(target)) => {
                match self.blobs.write(&target.absolute, &raw.data).await {
                    Ok(()) => Some(target.relative.clone()),
                    Err(e) => {
                        tracing::warn!(
                            logical_id = %paths.logical_id,
                            error = %e,
                            "RAW sidecar not stored; continuing without it"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        metadata.width = Some(processed.width);
        metadata.height = Some(processed.height);
        let record = NewPhoto {
            user_id: request.uploader_id,
            category_id: request.category_id,
            title: request.title.trim().to_string(),
            description: clean_optional(&request.description),
            aircraft_type: clean_optional(&request.aircraft_type),
            airline: clean_optional(&request.airline),
            registration: clean_optional(&request.registration),
            airport: clean_optional(&request.airport),
            file_path: paths.main.relative.clone(),
            thumbnail_path: Some(paths.thumbnail_base.clone()),
            raw_file_path: raw_file_path.clone(),
            file_size: file.size(),
            metadata,
            status: ReviewStatus::Pending,
        };
        let tags = parse_tags(&request.tags);

        let file_path = record.file_path.clone();

        // Written artifacts now follow the commit's outcome, not the guard
        let mut durable: Vec<PathBuf> = std::iter::once(processed.main_path.clone())
            .chain(processed.thumbnails.values().cloned())
            .collect();
        if let (Some(_), Some(target)) = (&raw_file_path, &paths.raw) {
            durable.push(target.absolute.clone());
        }
        for path in &durable {
            guard.release(path);
        }

        let photo_id = self.commit(record, tags, durable, guard).await?;

        Ok(IngestedPhoto {
            photo_id,
            logical_id: paths.logical_id.clone(),
            file_path,
            width: processed.width,
            height: processed.height,
        })
    }

    /// Persist the record on a task of its own.
    ///
    /// Once started the commit runs to completion even if the ingest future
    /// is dropped, and `durable` is deleted only when the commit fails.
    async fn commit(
        &self,
        record: NewPhoto,
        tags: Vec<String>,
        durable: Vec<PathBuf>,
        guard: &mut ArtifactGuard,
    ) -> IngestResult<i64> {
        let metadata = Arc::clone(&self.metadata);
        let blobs = Arc::clone(&self.blobs);
        let owned = durable.clone();
        let task = tokio::spawn(async move {
            let result = metadata.create_photo_with_tags(&record, &tags).await;
            if result.is_err() {
                delete_all(blobs.as_ref(), &owned).await;
            }
            result
        });

        match task.await {
            Ok(result) => result.map_err(IngestError::Persist),
            Err(e) => {
                // The task died before it could clean up
                for path in &durable {
                    guard.track(path);
                }
                Err(IngestError::Persist(StoreError::Interrupted(e.to_string())))
            }
        }
    }
}

/// Split a comma-separated tag list, trimming and dropping empty and
/// repeated entries. Order of first appearance is kept.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn delete_all(blobs: &dyn BlobStore, paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = blobs.delete(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete artifact");
        }
    }
}

/// Files written on behalf of one upload that must not outlive a failure.
///
/// Tracked paths are deleted by [`ArtifactGuard::cleanup`]. If the guard is
/// dropped first (the ingestion future was cancelled), the deletions are
/// spawned on the current runtime instead. Paths handed to the metadata
/// commit are released first, so a cancelled ingest never deletes the files
/// of a row that commits.
struct ArtifactGuard {
    blobs: Arc<dyn BlobStore>,
    pending: Vec<PathBuf>,
}

impl ArtifactGuard {
    fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            pending: Vec::new(),
        }
    }

    fn track(&mut self, path: &Path) {
        self.pending.push(path.to_path_buf());
    }

    fn release(&mut self, path: &Path) {
        self.pending.retain(|p| p != path);
    }

    async fn cleanup(mut self) {
        let pending = std::mem::take(&mut self.pending);
        delete_all(self.blobs.as_ref(), &pending).await;
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let blobs = Arc::clone(&self.blobs);
                handle.spawn(async move {
                    delete_all(blobs.as_ref(), &pending).await;
                });
            }
            Err(_) => tracing::warn!(
                count = pending.len(),
                "No runtime available; leaving orphaned upload artifacts"
            ),
        }
    }
}
