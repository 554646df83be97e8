//! Error types for the segmentation core.

use thiserror::Error;

/// Errors produced while decoding an image or running the segmentation model
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Image error: {0}")]
    Image(String),
}

impl From<image::ImageError> for SegmentError {
    fn from(err: image::ImageError) -> Self {
        SegmentError::Image(err.to_string())
    }
}

/// Errors produced while writing segmentation outputs to disk.
///
/// Persistence is best-effort: files written before the failing one are
/// left in place and the caller decides how to proceed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to encode output image {path}: {message}")]
    Encode { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_error_display() {
        let err = SegmentError::ModelLoad("missing file".to_string());
        assert_eq!(err.to_string(), "Failed to load model: missing file");

        let err = SegmentError::Inference("bad tensor".to_string());
        assert_eq!(err.to_string(), "Inference error: bad tensor");
    }

    #[test]
    fn test_persist_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PersistError = io.into();
        assert!(err.to_string().contains("denied"));
    }
}
