//! EXIF orientation correction.
//!
//! Rotation angles are counter-clockwise, so code 6 (camera turned right) is
//! corrected by a 270° rotation and code 8 by a 90° rotation.

use image::DynamicImage;

/// Geometric transform that brings an image upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Code 1
    Identity,
    /// Code 2
    FlipHorizontal,
    /// Code 3
    Rotate180,
    /// Code 4
    FlipVertical,
    /// Code 5: mirror across the top-left/bottom-right diagonal
    Transpose,
    /// Code 6
    Rotate270,
    /// Code 7: mirror across the top-right/bottom-left diagonal
    Transverse,
    /// Code 8
    Rotate90,
}

impl Orientation {
    /// Map an EXIF orientation code; unknown or absent codes are identity.
    pub fn from_exif(code: Option<u32>) -> Self {
        match code {
            Some(2) => Orientation::FlipHorizontal,
            Some(3) => Orientation::Rotate180,
            Some(4) => Orientation::FlipVertical,
            Some(5) => Orientation::Transpose,
            Some(6) => Orientation::Rotate270,
            Some(7) => Orientation::Transverse,
            Some(8) => Orientation::Rotate90,
            _ => Orientation::Identity,
        }
    }

    /// Apply the transform.
    pub fn apply(&self, img: DynamicImage) -> DynamicImage {
        tracing::trace!(orientation = ?self, "Applying orientation");
        match self {
            Orientation::Identity => img,
            Orientation::FlipHorizontal => img.fliph(),
            Orientation::Rotate180 => img.rotate180(),
            Orientation::FlipVertical => img.flipv(),
            // image's rotate90/rotate270 are clockwise
            Orientation::Transpose => img.rotate90().fliph(),
            Orientation::Rotate270 => img.rotate90(),
            Orientation::Transverse => img.rotate270().fliph(),
            Orientation::Rotate90 => img.rotate270(),
        }
    }
}
