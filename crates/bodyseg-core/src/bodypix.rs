//! BodyPix body-part segmentation backend via ONNX Runtime.
//!
//! BodyPix (MobileNet export) takes a square RGB input normalized to
//! `[-1, 1]` and emits part scores in channels-last `(1, H, W, C)` order,
//! channel 0 being background. Same contract as the Sapiens backend: the
//! returned mask is resized to the source image.

use crate::error::SegmentError;
use crate::organizer::LabelMask;
use crate::segmenter::{resize_mask_nearest, Segmenter};
use image::RgbImage;
use ndarray::{Array, Array4};
use ort::{session::Session, value::TensorRef};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Configuration for the BodyPix backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodypixConfig {
    /// Square model input size (BodyPix default is 513)
    pub input_size: u32,
}

impl Default for BodypixConfig {
    fn default() -> Self {
        Self { input_size: 513 }
    }
}

/// BodyPix segmenter backed by an ONNX Runtime session
pub struct BodypixSegmenter {
    session: Session,
    config: BodypixConfig,
}

impl BodypixSegmenter {
    /// Load the model from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P, config: BodypixConfig) -> Result<Self, SegmentError> {
        info!("Loading BodyPix model from {:?}", model_path.as_ref());

        let session = Session::builder()
            .map_err(|e| SegmentError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| SegmentError::ModelLoad(e.to_string()))?;

        info!("BodyPix model loaded successfully");

        Ok(Self { session, config })
    }
}

impl Segmenter for BodypixSegmenter {
    fn name(&self) -> &'static str {
        "bodypix"
    }

    fn segment(&mut self, image: &RgbImage) -> Result<LabelMask, SegmentError> {
        debug!(
            "Running BodyPix segmentation on {}x{} image",
            image.width(),
            image.height()
        );

        let input = preprocess(image, &self.config);

        let input_tensor = TensorRef::from_array_view(input.view())
            .map_err(|e| SegmentError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![input_tensor])
            .map_err(|e| SegmentError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| SegmentError::Inference(format!("Failed to extract tensor: {e}")))?;

        let dims = shape.as_ref();
        if dims.len() != 4 {
            return Err(SegmentError::Inference(format!(
                "Expected 4D output tensor, got {}D",
                dims.len()
            )));
        }

        // Channels-last: (1, H, W, C)
        let height = dims[1] as usize;
        let width = dims[2] as usize;
        let channels = dims[3] as usize;

        let mask = argmax_hwc(data, height, width, channels);
        Ok(resize_mask_nearest(&mask, image.width(), image.height()))
    }
}

/// Resize and normalize to the `(1, H, W, 3)` layout BodyPix expects
fn preprocess(image: &RgbImage, config: &BodypixConfig) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        config.input_size,
        config.input_size,
        image::imageops::FilterType::Triangle,
    );

    let size = config.input_size as usize;
    let mut input = Array::zeros((1, size, size, 3));
    for y in 0..size {
        for x in 0..size {
            let pixel = resized.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                // MobileNet normalization to [-1, 1]
                input[[0, y, x, c]] = f32::from(pixel[c]) / 127.5 - 1.0;
            }
        }
    }
    input
}

/// Argmax over the trailing class axis of a flat `(1, H, W, C)` tensor
fn argmax_hwc(data: &[f32], height: usize, width: usize, channels: usize) -> LabelMask {
    LabelMask::from_shape_fn((height, width), |(y, x)| {
        let base = (y * width + x) * channels;
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (c, &score) in data[base..base + channels].iter().enumerate() {
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        best_class as i32
    })
}
