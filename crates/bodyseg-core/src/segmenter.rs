//! The segmentation model boundary.
//!
//! The pipeline only ever talks to [`Segmenter`]; the two ONNX backends
//! ([`crate::SapiensSegmenter`], [`crate::BodypixSegmenter`]) are
//! interchangeable behind it. `&mut self` keeps inference serialized: one
//! in-flight call per model handle, by construction.

use crate::error::SegmentError;
use crate::organizer::LabelMask;
use image::RgbImage;
use ndarray::Array2;

/// A body-part segmentation model.
///
/// `segment` is synchronous and blocking with unspecified latency; errors
/// are terminal for the one image being processed, never for the pipeline.
pub trait Segmenter {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Run inference and return a per-pixel label mask sized to the input
    /// image, `0` meaning background.
    fn segment(&mut self, image: &RgbImage) -> Result<LabelMask, SegmentError>;
}

/// Nearest-neighbor resize of a label mask back to source dimensions.
///
/// Labels are categorical, so interpolation is not an option.
pub(crate) fn resize_mask_nearest(mask: &LabelMask, out_width: u32, out_height: u32) -> LabelMask {
    let (in_height, in_width) = mask.dim();
    let (out_w, out_h) = (out_width as usize, out_height as usize);

    if (in_height, in_width) == (out_h, out_w) {
        return mask.clone();
    }

    Array2::from_shape_fn((out_h, out_w), |(y, x)| {
        let src_y = (y * in_height / out_h).min(in_height - 1);
        let src_x = (x * in_width / out_w).min(in_width - 1);
        mask[(src_y, src_x)]
    })
}
