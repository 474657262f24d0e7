//! Ingestion pipeline components.
//!
//! Stages, leaves first:
//! - **signature**: Declarative content-signature table
//! - **validate**: Size, extension, file-name and signature checks
//! - **metadata**: EXIF extraction into an all-optional record
//! - **orientation**: EXIF orientation transforms
//! - **thumbnail**: Crop-to-fill thumbnail renditions
//! - **transform**: Main-image normalization plus thumbnails
//! - **ingest**: Orchestrates the stages against the blob and metadata stores

pub mod ingest;
pub mod metadata;
pub mod orientation;
pub mod signature;
pub mod thumbnail;
pub mod transform;
pub mod validate;

// Re-exports for convenient access
pub use ingest::{parse_tags, Ingestor};
pub use metadata::MetadataExtractor;
pub use orientation::Orientation;
pub use thumbnail::ThumbnailGenerator;
pub use transform::{fit_within, ImageTransformer, RenderedImageSet};
pub use validate::Validator;
