//! Sub-configuration structs with their documented defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage root for every artifact the pipeline writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the `{photos|thumbnails|raw|temp}` tree
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("~/.hangar/media"),
        }
    }
}

/// SQLite metadata store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file location
    pub path: PathBuf,

    /// Connection pool size
    pub max_connections: u32,

    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("~/.hangar/hangar.db"),
            max_connections: 5,
            busy_timeout_ms: 5000,
        }
    }
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum size of the primary image in bytes
    pub max_upload_bytes: u64,

    /// Maximum size of a RAW sidecar in bytes
    pub max_raw_upload_bytes: u64,

    /// Maximum title length in characters
    pub max_title_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024,
            max_raw_upload_bytes: 150 * 1024 * 1024,
            max_title_len: 200,
        }
    }
}

/// Accepted upload formats.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatsConfig {
    /// Extensions accepted for the primary image (lower-case, no dot)
    pub image_extensions: Vec<String>,

    /// Extensions accepted for the RAW sidecar
    pub raw_extensions: Vec<String>,

    /// Compare header bytes against the signature table
    pub verify_signatures: bool,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            image_extensions: ["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff", "tif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            raw_extensions: ["cr2", "cr3", "nef", "arw", "raf", "orf", "rw2", "dng"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            verify_signatures: true,
        }
    }
}

/// One thumbnail rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSpec {
    /// Size name, used as the file name suffix (`{id}_{name}.jpg`)
    pub name: String,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// JPEG quality (1-100)
    pub quality: u8,
}

impl ThumbnailSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32, quality: u8) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            quality,
        }
    }
}

/// Image transformer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Longest side allowed for the main image before downsampling
    pub max_dimension: u32,

    /// JPEG quality of the main image (1-100)
    pub quality: u8,

    /// Thumbnail renditions, all produced for every upload
    pub thumbnails: Vec<ThumbnailSpec>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_dimension: 4096,
            quality: 92,
            thumbnails: vec![
                ThumbnailSpec::new("sm", 300, 200, 80),
                ThumbnailSpec::new("md", 800, 533, 85),
                ThumbnailSpec::new("lg", 1600, 1067, 90),
            ],
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
