//! Storage path conventions.
//!
//! Every artifact of one upload shares a logical id and a date bucket:
//!
//! ```text
//! {root}/photos/{yyyy}/{mm}/{dd}/{id}.jpg
//! {root}/thumbnails/{yyyy}/{mm}/{dd}/{id}_{size}.jpg
//! {root}/raw/{yyyy}/{mm}/{dd}/{id}.{ext}
//! {root}/temp/{id}.{ext}
//! ```
//!
//! Each path comes in two flavors: the absolute one used for file I/O and the
//! relative one (`/photos/...`) stored in the database. They differ only by the
//! root prefix.

use chrono::{DateTime, Datelike, Utc};
use std::path::{Path, PathBuf};

use crate::config::ThumbnailSpec;

const PHOTOS_DIR: &str = "photos";
const THUMBNAILS_DIR: &str = "thumbnails";
const RAW_DIR: &str = "raw";
const TEMP_DIR: &str = "temp";

/// Extension of every rendered image.
pub const RENDER_EXTENSION: &str = "jpg";

/// One artifact location in both flavors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPath {
    /// Location on disk, under the storage root
    pub absolute: PathBuf,

    /// Root-independent form, always starting with `/`
    pub relative: String,
}

/// Every path one upload may write.
#[derive(Debug, Clone)]
pub struct UploadPaths {
    pub logical_id: String,
    pub temp: ArtifactPath,
    pub main: ArtifactPath,

    /// Relative thumbnail path without the size suffix
    pub thumbnail_base: String,

    /// One entry per configured size, in configuration order
    pub thumbnails: Vec<(String, ArtifactPath)>,

    pub raw: Option<ArtifactPath>,
}

impl UploadPaths {
    /// Every durable artifact path (temp excluded).
    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactPath> {
        std::iter::once(&self.main)
            .chain(self.thumbnails.iter().map(|(_, p)| p))
            .chain(self.raw.iter())
    }
}

/// Date-bucketed naming under a storage root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Main image location.
    pub fn photo(&self, at: &DateTime<Utc>, id: &str) -> ArtifactPath {
        self.artifact(format!(
            "/{PHOTOS_DIR}/{}/{id}.{RENDER_EXTENSION}",
            date_bucket(at)
        ))
    }

    /// Relative thumbnail base, as stored in the database.
    pub fn thumbnail_base(&self, at: &DateTime<Utc>, id: &str) -> String {
        format!("/{THUMBNAILS_DIR}/{}/{id}", date_bucket(at))
    }

    /// Location of one thumbnail size.
    pub fn thumbnail(&self, at: &DateTime<Utc>, id: &str, size: &str) -> ArtifactPath {
        self.artifact(thumbnail_url(&self.thumbnail_base(at, id), size))
    }

    /// RAW sidecar location; keeps the uploaded extension.
    pub fn raw(&self, at: &DateTime<Utc>, id: &str, extension: &str) -> ArtifactPath {
        self.artifact(format!("/{RAW_DIR}/{}/{id}.{extension}", date_bucket(at)))
    }

    /// Staging location. Not date-bucketed.
    pub fn temp(&self, id: &str, extension: &str) -> ArtifactPath {
        self.artifact(format!("/{TEMP_DIR}/{id}.{extension}"))
    }

    /// All paths for one upload.
    pub fn upload_paths(
        &self,
        at: &DateTime<Utc>,
        id: &str,
        extension: &str,
        raw_extension: Option<&str>,
        thumbnails: &[ThumbnailSpec],
    ) -> UploadPaths {
        UploadPaths {
            logical_id: id.to_string(),
            temp: self.temp(id, extension),
            main: self.photo(at, id),
            thumbnail_base: self.thumbnail_base(at, id),
            thumbnails: thumbnails
                .iter()
                .map(|spec| (spec.name.clone(), self.thumbnail(at, id, &spec.name)))
                .collect(),
            raw: raw_extension.map(|ext| self.raw(at, id, ext)),
        }
    }

    /// Absolute path for a stored relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative.trim_start_matches('/'))
    }

    fn artifact(&self, relative: String) -> ArtifactPath {
        ArtifactPath {
            absolute: self.resolve(&relative),
            relative,
        }
    }
}

/// Relative path of one thumbnail size, from the stored thumbnail base.
pub fn thumbnail_url(base: &str, size: &str) -> String {
    format!("{base}_{size}.{RENDER_EXTENSION}")
}

fn date_bucket(at: &DateTime<Utc>) -> String {
    format!("{:04}/{:02}/{:02}", at.year(), at.month(), at.day())
}
