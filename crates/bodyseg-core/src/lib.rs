//! bodyseg-core: body-part segmentation primitives
//!
//! This crate provides:
//! - The static label taxonomy (label → part name → group → color)
//! - Mask organizing: per-part binary masks and grouped PNG persistence
//! - The [`Segmenter`] trait and its two ONNX backends (Sapiens, BodyPix)
//! - Image loading helpers
//!
//! The daemon crate wires these into the watch/queue/process pipeline.

pub mod bodypix;
pub mod error;
pub mod image_io;
pub mod organizer;
pub mod sapiens;
pub mod segmenter;
pub mod taxonomy;

// Re-exports for convenience
pub use bodypix::{BodypixConfig, BodypixSegmenter};
pub use error::{PersistError, SegmentError};
pub use image_io::load_image;
pub use organizer::{
    ensure_group_dirs, extract_parts, persist, LabelMask, PartResult, SegmentationResult,
};
pub use sapiens::{SapiensConfig, SapiensModel, SapiensSegmenter};
pub use segmenter::Segmenter;
pub use taxonomy::{color_of, group_of, part_name_of, Group};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_reexports() {
        assert_eq!(part_name_of(1), "head");
        assert_eq!(group_of("head"), Group::Head);
        let _ = color_of("head");
    }

    #[test]
    fn test_organizer_reexports() {
        let mask: LabelMask = ndarray::Array2::zeros((2, 2));
        let parts = extract_parts(&mask, 0);
        assert!(parts.is_empty());
    }

    #[test]
    fn test_segmenter_trait_is_object_safe() {
        fn _takes_dyn(_s: &mut dyn Segmenter) {}
        let _ = std::any::type_name::<SapiensSegmenter>();
        let _ = std::any::type_name::<BodypixSegmenter>();
    }
}
