//! Mask organizing: split a raw label mask into per-part binary masks and
//! persist them as color-coded PNGs grouped by anatomical region.
//!
//! Extraction is a pure transformation over the in-memory mask; writing to
//! disk is a separate step so the two can be tested independently.

use crate::error::PersistError;
use crate::taxonomy::{color_of, group_of, part_name_of, Group};
use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::Array2;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Per-pixel label grid produced by a segmentation backend.
///
/// Row-major `height × width`, label `0` reserved for background.
pub type LabelMask = Array2<i32>;

/// One detected body part: a named, grouped binary mask
#[derive(Debug, Clone)]
pub struct PartResult {
    /// Part name from the taxonomy (or `part_<label>` for unknown labels)
    pub name: String,
    /// Raw label id in the source mask
    pub label_id: i32,
    /// Number of non-zero pixels in `mask`
    pub pixel_count: u32,
    /// Binary mask, 255 where the part is present, 0 elsewhere
    pub mask: Array2<u8>,
    /// Anatomical group used for the output directory
    pub group: Group,
}

/// Everything produced by one processing cycle for one source image
#[derive(Debug)]
pub struct SegmentationResult {
    pub source_path: PathBuf,
    pub mask: LabelMask,
    pub parts: Vec<PartResult>,
    pub elapsed: Duration,
}

/// Extract one [`PartResult`] per distinct non-zero label in the mask.
///
/// Parts are ordered ascending by label id, so the output is reproducible
/// for a given mask. A part is included iff its pixel count is strictly
/// greater than `min_pixels`; pass `0` to keep every non-empty part.
#[must_use]
pub fn extract_parts(mask: &LabelMask, min_pixels: u32) -> Vec<PartResult> {
    // BTreeSet gives the ascending label order for free
    let labels: BTreeSet<i32> = mask.iter().copied().filter(|&l| l != 0).collect();

    let mut parts = Vec::with_capacity(labels.len());
    for label in labels {
        let mut pixel_count: u32 = 0;
        let part_mask = mask.mapv(|v| {
            if v == label {
                pixel_count += 1;
                255u8
            } else {
                0u8
            }
        });

        if pixel_count <= min_pixels {
            debug!(
                "Dropping label {} ({} px <= threshold {})",
                label, pixel_count, min_pixels
            );
            continue;
        }

        let name = part_name_of(label);
        let group = group_of(&name);
        parts.push(PartResult {
            name,
            label_id: label,
            pixel_count,
            mask: part_mask,
            group,
        });
    }

    parts
}

/// Ensure `<output_dir>/<group>/` exists for every group. Idempotent.
pub fn ensure_group_dirs(output_dir: &Path) -> Result<(), PersistError> {
    std::fs::create_dir_all(output_dir)?;
    for group in Group::ALL {
        std::fs::create_dir_all(output_dir.join(group.as_str()))?;
    }
    Ok(())
}

/// Write one color-coded PNG per part plus the full label mask.
///
/// Layout: `<output_dir>/<group>/<part_name>_<base_name>.png` for each part
/// and `<output_dir>/<base_name>_full_segmentation.png` for the raw mask.
/// Returns the written paths in write order. On failure the files written
/// before the failing one are left in place.
pub fn persist(
    output_dir: &Path,
    base_name: &str,
    parts: &[PartResult],
    full_mask: &LabelMask,
) -> Result<Vec<PathBuf>, PersistError> {
    ensure_group_dirs(output_dir)?;

    let mut written = Vec::with_capacity(parts.len() + 1);

    for part in parts {
        let colored = render_colored_mask(&part.mask, &part.name);
        let target = output_dir
            .join(part.group.as_str())
            .join(format!("{}_{}.png", part.name, base_name));
        colored.save(&target).map_err(|e| PersistError::Encode {
            path: target.display().to_string(),
            message: e.to_string(),
        })?;
        debug!("Saved {} to {}", part.name, target.display());
        written.push(target);
    }

    let full_path = output_dir.join(format!("{base_name}_full_segmentation.png"));
    let full_image = render_label_mask(full_mask);
    full_image.save(&full_path).map_err(|e| PersistError::Encode {
        path: full_path.display().to_string(),
        message: e.to_string(),
    })?;
    written.push(full_path);

    info!("Saved {} files for {}", written.len(), base_name);
    Ok(written)
}

/// Paint the part's color wherever the binary mask is set, black elsewhere
fn render_colored_mask(mask: &Array2<u8>, part_name: &str) -> RgbImage {
    let (height, width) = mask.dim();
    let color = color_of(part_name);

    let mut img = RgbImage::new(width as u32, height as u32);
    for ((y, x), &v) in mask.indexed_iter() {
        if v > 0 {
            img.put_pixel(x as u32, y as u32, color);
        } else {
            img.put_pixel(x as u32, y as u32, Rgb([0, 0, 0]));
        }
    }
    img
}

/// Encode the raw label mask as an 8-bit grayscale image.
///
/// Labels outside 0..=255 saturate; the per-part color PNGs carry the exact
/// shapes, this file is the compact whole-image view.
fn render_label_mask(mask: &LabelMask) -> GrayImage {
    let (height, width) = mask.dim();
    let mut img = GrayImage::new(width as u32, height as u32);
    for ((y, x), &label) in mask.indexed_iter() {
        img.put_pixel(x as u32, y as u32, Luma([label.clamp(0, 255) as u8]));
    }
    img
}
