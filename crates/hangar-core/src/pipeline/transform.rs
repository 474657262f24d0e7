//! Main-image normalization and thumbnail rendering.

use image::imageops::FilterType;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use crate::config::ProcessingConfig;
use crate::error::{TransformError, TransformStage};
use crate::paths::UploadPaths;
use crate::storage::BlobStore;
use crate::types::ProcessedImageSet;

use super::orientation::Orientation;
use super::thumbnail::{encode_jpeg, ThumbnailGenerator};

/// Encoded output of [`ImageTransformer::render`], not yet written anywhere.
#[derive(Debug, Clone)]
pub struct RenderedImageSet {
    /// Main image as JPEG
    pub main: Vec<u8>,

    /// `(size name, JPEG bytes)` in configuration order
    pub thumbnails: Vec<(String, Vec<u8>)>,

    pub width: u32,
    pub height: u32,
}

/// Auto-rotates, downsamples and renders thumbnails.
#[derive(Debug, Clone)]
pub struct ImageTransformer {
    config: ProcessingConfig,
    thumbnails: ThumbnailGenerator,
}

impl ImageTransformer {
    pub fn new(config: ProcessingConfig) -> Self {
        let thumbnails = ThumbnailGenerator::new(config.thumbnails.clone());
        Self { config, thumbnails }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Render and write the main image and every thumbnail.
    ///
    /// Files already written when a later one fails are left in place; the
    /// caller owns cleanup of every path in `paths`.
    pub async fn process(
        &self,
        source: Vec<u8>,
        orientation: Option<u32>,
        paths: &UploadPaths,
        store: &dyn BlobStore,
    ) -> Result<ProcessedImageSet, TransformError> {
        let start = Instant::now();
        let transformer = self.clone();
        let rendered = tokio::task::spawn_blocking(move || transformer.render(&source, orientation))
            .await
            .map_err(|e| {
                TransformError::new(TransformStage::Open, format!("Task join error: {}", e))
            })??;
        tracing::trace!("  Render: {:?}", start.elapsed());

        store
            .write(&paths.main.absolute, &rendered.main)
            .await
            .map_err(|e| TransformError::new(TransformStage::EncodeMain, e.to_string()))?;

        let mut thumbnails = BTreeMap::new();
        for ((name, bytes), (_, target)) in rendered.thumbnails.iter().zip(&paths.thumbnails) {
            store.write(&target.absolute, bytes).await.map_err(|e| {
                TransformError::new(TransformStage::EncodeThumbnail(name.clone()), e.to_string())
            })?;
            thumbnails.insert(name.clone(), target.absolute.clone());
        }

        tracing::debug!(
            "Transformed {} in {:?} ({}x{}, {} thumbnails)",
            paths.logical_id,
            start.elapsed(),
            rendered.width,
            rendered.height,
            thumbnails.len()
        );

        Ok(ProcessedImageSet {
            main_path: paths.main.absolute.clone(),
            thumbnails,
            width: rendered.width,
            height: rendered.height,
        })
    }

    /// Decode, orient, downsample and encode. CPU-bound; call off the runtime.
    pub fn render(
        &self,
        source: &[u8],
        orientation: Option<u32>,
    ) -> Result<RenderedImageSet, TransformError> {
        let image = Self::decode(source)?;

        let orientation = Orientation::from_exif(orientation);
        let image = catch_unwind(AssertUnwindSafe(|| orientation.apply(image)))
            .map_err(|_| TransformError::new(TransformStage::Rotate, "rotation panicked"))?;

        let max = self.config.max_dimension;
        let image = catch_unwind(AssertUnwindSafe(|| downsample(image, max)))
            .map_err(|_| TransformError::new(TransformStage::Resize, "resize panicked"))?;

        let main = encode_jpeg(&image, self.config.quality)
            .map_err(|e| TransformError::new(TransformStage::EncodeMain, e.to_string()))?;
        let thumbnails = self.thumbnails.generate_all(&image)?;

        Ok(RenderedImageSet {
            main,
            thumbnails,
            width: image.width(),
            height: image.height(),
        })
    }

    fn decode(source: &[u8]) -> Result<DynamicImage, TransformError> {
        image::ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| {
                TransformError::new(
                    TransformStage::Open,
                    format!("Cannot detect image format: {}", e),
                )
            })?
            .decode()
            .map_err(|e| TransformError::new(TransformStage::Open, e.to_string()))
    }
}

/// Dimensions with the longer side clamped to `max`, aspect ratio preserved.
///
/// Images already within `max` on both axes are returned unchanged.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let (w, h, m) = (width as u64, height as u64, max as u64);
    let (new_w, new_h) = if width >= height {
        (m, (h * m + w / 2) / w)
    } else {
        ((w * m + h / 2) / h, m)
    };
    (new_w.max(1) as u32, new_h.max(1) as u32)
}

/// Resize so neither side exceeds `max`, using Lanczos3.
pub fn downsample(image: DynamicImage, max: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let (new_w, new_h) = fit_within(width, height, max);
    if (new_w, new_h) == (width, height) {
        return image;
    }
    tracing::trace!("Downsampling {}x{} to {}x{}", width, height, new_w, new_h);
    image.resize_exact(new_w, new_h, FilterType::Lanczos3)
}
