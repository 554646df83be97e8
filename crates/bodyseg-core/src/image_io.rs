//! Image loading for the processing pipeline.
//!
//! Decoding goes through the `image` crate, which covers the whole
//! extension allow-list the watcher accepts (PNG, JPEG, BMP, TIFF, WebP).

use crate::error::SegmentError;
use image::RgbImage;
use std::path::Path;

/// Load an image from disk and convert it to RGB8
pub fn load_image(path: &Path) -> Result<RgbImage, SegmentError> {
    let img = image::open(path)
        .map_err(|e| SegmentError::Image(format!("Failed to load {}: {e}", path.display())))?;
    Ok(img.to_rgb8())
}
