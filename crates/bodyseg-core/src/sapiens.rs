//! Sapiens body-part segmentation backend via ONNX Runtime.
//!
//! Sapiens models take a fixed 768×1024 RGB input with ImageNet
//! normalization and emit per-class logits at `(1, C, H, W)`; argmax over
//! the class axis yields the label mask, which is then resized back to the
//! source image with nearest-neighbor sampling.

use crate::error::SegmentError;
use crate::organizer::LabelMask;
use crate::segmenter::{resize_mask_nearest, Segmenter};
use image::RgbImage;
use ndarray::{Array, Array4};
use ort::{session::Session, value::TensorRef};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// ImageNet channel means used by Sapiens preprocessing
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Sapiens model size variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SapiensModel {
    /// Sapiens 0.3B parameters - fastest inference
    Small,
    /// Sapiens 0.6B parameters - balanced speed/accuracy
    Medium,
    /// Sapiens 1B parameters - good accuracy
    Large,
    /// Sapiens 2B parameters - highest accuracy
    XLarge,
}

impl SapiensModel {
    /// Get the typical model filename for this size
    #[must_use]
    pub fn filename(&self) -> &'static str {
        match self {
            SapiensModel::Small => "sapiens_0.3b_seg.onnx",
            SapiensModel::Medium => "sapiens_0.6b_seg.onnx",
            SapiensModel::Large => "sapiens_1b_seg.onnx",
            SapiensModel::XLarge => "sapiens_2b_seg.onnx",
        }
    }

    /// Size label as it appears in configuration ("0.3b", "0.6b", "1b", "2b")
    #[must_use]
    pub fn size_label(&self) -> &'static str {
        match self {
            SapiensModel::Small => "0.3b",
            SapiensModel::Medium => "0.6b",
            SapiensModel::Large => "1b",
            SapiensModel::XLarge => "2b",
        }
    }

    /// Parse a configuration size label
    #[must_use]
    pub fn from_size_label(label: &str) -> Option<Self> {
        match label {
            "0.3b" => Some(SapiensModel::Small),
            "0.6b" => Some(SapiensModel::Medium),
            "1b" => Some(SapiensModel::Large),
            "2b" => Some(SapiensModel::XLarge),
            _ => None,
        }
    }
}

/// Configuration for the Sapiens backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SapiensConfig {
    /// Model input width (Sapiens segmentation default is 768)
    pub input_width: u32,
    /// Model input height (Sapiens segmentation default is 1024)
    pub input_height: u32,
}

impl Default for SapiensConfig {
    fn default() -> Self {
        Self {
            input_width: 768,
            input_height: 1024,
        }
    }
}

/// Sapiens segmenter backed by an ONNX Runtime session
pub struct SapiensSegmenter {
    session: Session,
    config: SapiensConfig,
}

impl SapiensSegmenter {
    /// Load the model from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P, config: SapiensConfig) -> Result<Self, SegmentError> {
        info!("Loading Sapiens model from {:?}", model_path.as_ref());

        let session = Session::builder()
            .map_err(|e| SegmentError::ModelLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| SegmentError::ModelLoad(e.to_string()))?;

        info!("Sapiens model loaded successfully");

        Ok(Self { session, config })
    }
}

impl Segmenter for SapiensSegmenter {
    fn name(&self) -> &'static str {
        "sapiens"
    }

    fn segment(&mut self, image: &RgbImage) -> Result<LabelMask, SegmentError> {
        debug!(
            "Running Sapiens segmentation on {}x{} image",
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

        let channels = dims[1] as usize;
        let height = dims[2] as usize;
        let width = dims[3] as usize;

        let mask = argmax_chw(data, channels, height, width);
        Ok(resize_mask_nearest(&mask, image.width(), image.height()))
    }
}

/// Resize and normalize to the `(1, 3, H, W)` layout Sapiens expects
fn preprocess(image: &RgbImage, config: &SapiensConfig) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        config.input_width,
        config.input_height,
        image::imageops::FilterType::Triangle,
    );

    let (w, h) = (config.input_width as usize, config.input_height as usize);
    let mut input = Array::zeros((1, 3, h, w));
    for y in 0..h {
        for x in 0..w {
            let pixel = resized.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                input[[0, c, y, x]] = (f32::from(pixel[c]) / 255.0 - MEAN[c]) / STD[c];
            }
        }
    }
    input
}

/// Argmax over the class axis of a flat `(1, C, H, W)` logit tensor
fn argmax_chw(data: &[f32], channels: usize, height: usize, width: usize) -> LabelMask {
    LabelMask::from_shape_fn((height, width), |(y, x)| {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..channels {
            let score = data[(c * height + y) * width + x];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        best_class as i32
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_filenames() {
        assert_eq!(SapiensModel::Small.filename(), "sapiens_0.3b_seg.onnx");
        assert_eq!(SapiensModel::Large.filename(), "sapiens_1b_seg.onnx");
    }

    #[test]
    fn test_model_size_label_roundtrip() {
        for model in [
            SapiensModel::Small,
            SapiensModel::Medium,
            SapiensModel::Large,
            SapiensModel::XLarge,
        ] {
            assert_eq!(SapiensModel::from_size_label(model.size_label()), Some(model));
        }
        assert_eq!(SapiensModel::from_size_label("7b"), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = SapiensConfig::default();
        assert_eq!(config.input_width, 768);
        assert_eq!(config.input_height, 1024);
    }

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let mut img = RgbImage::new(4, 4);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([255, 255, 255]);
        }

        let config = SapiensConfig {
            input_width: 2,
            input_height: 2,
        };
        let input = preprocess(&img, &config);

        assert_eq!(input.dim(), (1, 3, 2, 2));
        // White pixel: (1.0 - mean) / std per channel
        let expected = (1.0 - MEAN[0]) / STD[0];
        assert!((input[[0, 0, 0, 0]] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_argmax_chw_picks_strongest_class() {
        // 3 classes on a 1x2 grid: pixel 0 -> class 2, pixel 1 -> class 0
        let data = [
            0.1, 0.9, // class 0
            0.2, 0.1, // class 1
            0.7, 0.3, // class 2
        ];
        let mask = argmax_chw(&data, 3, 1, 2);
        assert_eq!(mask[(0, 0)], 2);
        assert_eq!(mask[(0, 1)], 0);
    }
}
