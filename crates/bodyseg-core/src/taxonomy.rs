//! Static body-part taxonomy: label ids, part names, anatomical groups,
//! and the deterministic part→color mapping.
//!
//! All lookups here are total. Labels outside the model's table are named
//! `part_<label>` and grouped under [`Group::Other`] so no non-background
//! label is ever dropped on the floor.

use image::Rgb;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Fixed saturation for generated part colors
const COLOR_SATURATION: f32 = 0.8;

/// Fixed value (brightness) for generated part colors
const COLOR_VALUE: f32 = 0.9;

/// Coarse anatomical group used to organize output directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Head,
    LeftArm,
    RightArm,
    Torso,
    LeftLeg,
    RightLeg,
    Other,
}

impl Group {
    /// All groups, in output-directory order
    pub const ALL: [Group; 7] = [
        Group::Head,
        Group::LeftArm,
        Group::RightArm,
        Group::Torso,
        Group::LeftLeg,
        Group::RightLeg,
        Group::Other,
    ];

    /// Directory name for this group
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Head => "head",
            Group::LeftArm => "left_arm",
            Group::RightArm => "right_arm",
            Group::Torso => "torso",
            Group::LeftLeg => "left_leg",
            Group::RightLeg => "right_leg",
            Group::Other => "other",
        }
    }
}

/// Map a segmentation label id to a part name.
///
/// Known labels come from the model's class table; anything else (including
/// negative or out-of-range ids) is synthesized as `part_<label>`.
#[must_use]
pub fn part_name_of(label: i32) -> String {
    match label {
        1 => "head".to_string(),
        2 => "torso".to_string(),
        3 => "left_arm".to_string(),
        4 => "right_arm".to_string(),
        5 => "left_leg".to_string(),
        6 => "right_leg".to_string(),
        7 => "left_hand".to_string(),
        8 => "right_hand".to_string(),
        9 => "left_foot".to_string(),
        10 => "right_foot".to_string(),
        other => format!("part_{other}"),
    }
}

/// Map a part name to its anatomical group.
///
/// Covers the finer sub-part names the segmentation models can emit;
/// unknown names fall back to [`Group::Other`].
#[must_use]
pub fn group_of(part_name: &str) -> Group {
    match part_name {
        "head" | "face" | "hair" | "left_eye" | "right_eye" | "nose" | "mouth" | "upper_lip"
        | "lower_lip" | "teeth" | "tongue" | "left_ear" | "right_ear" | "neck" => Group::Head,
        "left_shoulder" | "left_arm" | "left_elbow" | "left_forearm" | "left_hand" => {
            Group::LeftArm
        }
        "right_shoulder" | "right_arm" | "right_elbow" | "right_forearm" | "right_hand" => {
            Group::RightArm
        }
        "torso" | "chest" | "back" | "stomach" => Group::Torso,
        "left_hip" | "left_thigh" | "left_knee" | "left_shin" | "left_ankle" | "left_foot" => {
            Group::LeftLeg
        }
        "right_hip" | "right_thigh" | "right_knee" | "right_shin" | "right_ankle"
        | "right_foot" => Group::RightLeg,
        _ => Group::Other,
    }
}

/// Deterministic display color for a part name.
///
/// The name's xxh3 hash picks a hue; saturation and value are fixed. The
/// hash is seedless, so the same name maps to the same color in every
/// process and on every platform.
#[must_use]
pub fn color_of(part_name: &str) -> Rgb<u8> {
    let hue = (xxh3_64(part_name.as_bytes()) % 360) as f32;
    hsv_to_rgb(hue, COLOR_SATURATION, COLOR_VALUE)
}

/// Convert HSV (h in degrees [0,360), s and v in [0,1]) to RGB
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    Rgb([
        ((r1 + m) * 255.0) as u8,
        ((g1 + m) * 255.0) as u8,
        ((b1 + m) * 255.0) as u8,
    ])
}
