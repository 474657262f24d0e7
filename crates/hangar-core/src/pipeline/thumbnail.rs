//! Fixed-size thumbnail renditions with JPEG output.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageResult};

use crate::config::ThumbnailSpec;
use crate::error::{TransformError, TransformStage};

/// Generates the configured thumbnail renditions of an image.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    specs: Vec<ThumbnailSpec>,
}

impl ThumbnailGenerator {
    /// Create a new thumbnail generator for the given sizes.
    pub fn new(specs: Vec<ThumbnailSpec>) -> Self {
        Self { specs }
    }

    /// Configured sizes, in order.
    pub fn specs(&self) -> &[ThumbnailSpec] {
        &self.specs
    }

    /// Center-crop to the target aspect ratio, then scale to the target box.
    ///
    /// Cropping first keeps the working buffer no larger than the source or
    /// the output, whatever the source aspect ratio.
    pub fn crop_to_fill(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (crop_w, crop_h) = fill_region(image.width(), image.height(), width, height);
        let x = (image.width() - crop_w) / 2;
        let y = (image.height() - crop_h) / 2;
        image
            .crop_imm(x, y, crop_w, crop_h)
            .resize_exact(width, height, FilterType::Lanczos3)
    }

    /// Render one size and encode it at that size's quality.
    pub fn generate_bytes(
        &self,
        image: &DynamicImage,
        spec: &ThumbnailSpec,
    ) -> Result<Vec<u8>, TransformError> {
        let thumbnail = Self::crop_to_fill(image, spec.width, spec.height);
        encode_jpeg(&thumbnail, spec.quality).map_err(|e| {
            TransformError::new(TransformStage::EncodeThumbnail(spec.name.clone()), e.to_string())
        })
    }

    /// Render every configured size; the first failure aborts the rest.
    pub fn generate_all(&self, image: &DynamicImage) -> Result<Vec<(String, Vec<u8>)>, TransformError> {
        self.specs
            .iter()
            .map(|spec| Ok((spec.name.clone(), self.generate_bytes(image, spec)?)))
            .collect()
    }
}

/// Largest `src_w`x`src_h` sub-rectangle with the `width`:`height` ratio.
///
/// The free axis is rounded to nearest and clamped to `1..=src`.
fn fill_region(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    let (sw, sh, w, h) = (src_w as u64, src_h as u64, width as u64, height as u64);
    if sw * h >= sh * w {
        // Source is wider: keep full height
        let crop_w = (sh * w + h / 2) / h;
        (crop_w.clamp(1, sw) as u32, src_h)
    } else {
        let crop_h = (sw * h + w / 2) / w;
        (src_w, crop_h.clamp(1, sh) as u32)
    }
}

/// Encode as baseline JPEG at `quality` (1-100). Alpha is dropped.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessingConfig;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_crop_to_fill_exact_size_from_wide_source() {
        let img = DynamicImage::new_rgb8(4000, 2000);
        let thumb = ThumbnailGenerator::crop_to_fill(&img, 300, 200);
        assert_eq!(thumb.dimensions(), (300, 200));
    }

    #[test]
    fn test_crop_to_fill_every_default_size() {
        let generator = ThumbnailGenerator::new(ProcessingConfig::default().thumbnails);
        let img = DynamicImage::new_rgb8(1200, 600);
        for spec in generator.specs() {
            let thumb = ThumbnailGenerator::crop_to_fill(&img, spec.width, spec.height);
            assert_eq!(thumb.dimensions(), (spec.width, spec.height), "{}", spec.name);
        }
    }

    #[test]
    fn test_crop_to_fill_tall_source() {
        let img = DynamicImage::new_rgb8(600, 1800);
        let thumb = ThumbnailGenerator::crop_to_fill(&img, 800, 533);
        assert_eq!(thumb.dimensions(), (800, 533));
    }

    #[test]
    fn test_crop_to_fill_has_no_letterbox() {
        // Black bands at both ends, white center: a 3:1 source cropped to a
        // square keeps only the white center.
        let img = RgbImage::from_fn(300, 100, |x, _| {
            if (75..225).contains(&x) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let thumb = ThumbnailGenerator::crop_to_fill(&DynamicImage::ImageRgb8(img), 50, 50);
        let rgb = thumb.to_rgb8();
        for (x, y) in [(0, 0), (49, 0), (0, 49), (49, 49), (25, 25)] {
            let px = rgb.get_pixel(x, y);
            assert!(px[0] > 200, "pixel ({x},{y}) = {px:?}");
        }
    }

    #[test]
    fn test_fill_region_keeps_target_ratio() {
        assert_eq!(fill_region(4000, 2000, 300, 200), (3000, 2000));
        assert_eq!(fill_region(600, 1800, 800, 533), (600, 400));
        assert_eq!(fill_region(300, 200, 300, 200), (300, 200));
    }

    #[test]
    fn test_fill_region_never_exceeds_source() {
        assert_eq!(fill_region(4096, 2, 1600, 1067), (3, 2));
        assert_eq!(fill_region(2, 4096, 1600, 1067), (2, 1));
        assert_eq!(fill_region(1, 1, 1600, 1067), (1, 1));
    }

    #[test]
    fn test_crop_to_fill_extreme_panorama_is_bounded() {
        let img = DynamicImage::new_rgb8(4096, 2);
        let start = std::time::Instant::now();
        for spec in ProcessingConfig::default().thumbnails {
            let thumb = ThumbnailGenerator::crop_to_fill(&img, spec.width, spec.height);
            assert_eq!(thumb.dimensions(), (spec.width, spec.height), "{}", spec.name);
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(20));
    }

    #[test]
    fn test_generate_bytes_is_jpeg() {
        let generator = ThumbnailGenerator::new(vec![ThumbnailSpec::new("sm", 64, 48, 80)]);
        let img = DynamicImage::new_rgba8(200, 100);
        let bytes = generator.generate_bytes(&img, &generator.specs()[0]).unwrap();
        assert_eq!(&bytes[0..3], &[0xFF, 0xD8, 0xFF]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_generate_all_returns_every_size_in_order() {
        let generator = ThumbnailGenerator::new(vec![
            ThumbnailSpec::new("a", 30, 20, 80),
            ThumbnailSpec::new("b", 60, 40, 90),
        ]);
        let img = DynamicImage::new_rgb8(120, 80);
        let all = generator.generate_all(&img).unwrap();
        let names: Vec<_> = all.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_lower_quality_produces_smaller_output() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(256, 256, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        }));
        let low = encode_jpeg(&img, 10).unwrap();
        let high = encode_jpeg(&img, 95).unwrap();
        assert!(low.len() < high.len());
    }
}
