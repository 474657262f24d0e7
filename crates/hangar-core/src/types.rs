//! Core data types for the Hangar ingestion pipeline.
//!
//! Every optional attribute is an explicit `Option`; sentinel values (zero,
//! empty string) never stand in for "absent" at this level. Conversion to
//! nullable columns happens in the metadata store only.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A file handed to the pipeline by the caller.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied file name (untrusted)
    pub file_name: String,

    /// File contents
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Everything the uploader submitted for one photo.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Owner of the new photo
    pub uploader_id: i64,

    /// Primary image
    pub file: UploadFile,

    /// Optional camera RAW sidecar
    pub raw_file: Option<UploadFile>,

    /// Required, bounded title
    pub title: String,

    pub description: Option<String>,
    pub aircraft_type: Option<String>,
    pub airline: Option<String>,
    pub registration: Option<String>,
    pub airport: Option<String>,

    /// Category reference
    pub category_id: Option<i64>,

    /// Comma-separated tag list
    pub tags: String,
}

impl UploadRequest {
    /// Request with only the required fields set.
    pub fn new(uploader_id: i64, file: UploadFile, title: impl Into<String>) -> Self {
        Self {
            uploader_id,
            file,
            raw_file: None,
            title: title.into(),
            description: None,
            aircraft_type: None,
            airline: None,
            registration: None,
            airport: None,
            category_id: None,
            tags: String::new(),
        }
    }
}

/// Upload classes, each with its own allow-list and size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Image,
    Raw,
}

/// Camera and shooting metadata decoded from EXIF. Partial records are the
/// common case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera_serial: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_make: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,

    /// Nominal focal length in mm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,

    /// 35mm-equivalent focal length in mm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length_35mm: Option<u32>,

    /// F-number (e.g. 5.6)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,

    /// Formatted exposure time ("1/500 s", "3.0 s")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_program: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metering_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_balance: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,

    /// Formatted exposure compensation ("+0.7 EV", "0 EV", "-1.5 EV")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_bias: Option<String>,

    /// Capture time as recorded by the camera (no zone)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<NaiveDateTime>,

    /// Decimal degrees, present together with longitude or not at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_latitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_longitude: Option<f64>,

    /// Metres; negative below sea level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_altitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// EXIF orientation code (1-8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_space: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub software: Option<String>,
}

/// Files written by the image transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedImageSet {
    /// Normalized main image
    pub main_path: PathBuf,

    /// Thumbnail size name to file path; one entry per configured size
    pub thumbnails: BTreeMap<String, PathBuf>,

    /// Final main image width after downsampling
    pub width: u32,

    /// Final main image height after downsampling
    pub height: u32,
}

/// Moderation state of a photo. Ingestion only ever creates `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

/// A photo record ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPhoto {
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub aircraft_type: Option<String>,
    pub airline: Option<String>,
    pub registration: Option<String>,
    pub airport: Option<String>,

    /// Relative path of the main image (`/photos/...`)
    pub file_path: String,

    /// Relative thumbnail base (`/thumbnails/.../{id}`, no size suffix)
    pub thumbnail_path: Option<String>,

    /// Relative path of the RAW sidecar (`/raw/...`)
    pub raw_file_path: Option<String>,

    /// Size of the uploaded primary file in bytes
    pub file_size: u64,

    /// EXIF fields; `width`/`height` hold the final main-image dimensions
    pub metadata: ExtractedMetadata,

    pub status: ReviewStatus,
}

/// A stored photo as read back from the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPhoto {
    pub id: i64,

    #[serde(flatten)]
    pub photo: NewPhoto,

    /// Tag names linked to this photo, sorted
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
}

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedPhoto {
    /// Database id of the new photo
    pub photo_id: i64,

    /// Token shared by every artifact of this upload
    pub logical_id: String,

    /// Relative path of the main image
    pub file_path: String,

    pub width: u32,
    pub height: u32,
}
