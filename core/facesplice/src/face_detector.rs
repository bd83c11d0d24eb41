use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::crop::{padded_landmark_rect, to_square, Rect, SquareBox};
use crate::error::FaceSpliceError;

/// A single landmark in source-image pixels, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl From<[f32; 2]> for Landmark {
    fn from([x, y]: [f32; 2]) -> Self {
        Landmark { x, y }
    }
}

impl From<Landmark> for [f32; 2] {
    fn from(p: Landmark) -> Self {
        [p.x, p.y]
    }
}

/// A detected or hand-drawn face.
///
/// In JSON a region is tagged by `kind`:
///
/// ```json
/// [
///   { "kind": "box", "x1": 40, "y1": 30, "x2": 120, "y2": 140 },
///   { "kind": "landmarks", "points": [[210.5, 88.0], [250.1, 90.2]] }
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    /// Two corner points, used as-is (no padding). Corner order does not matter.
    Box { x1: i32, y1: i32, x2: i32, y2: i32 },

    /// Landmark points; the rectangle is derived from their bounds and padded.
    Landmarks { points: Vec<Landmark> },
}

impl Region {
    /// Region spanning two corner points.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Region::Box {
            x1: a.0,
            y1: a.1,
            x2: b.0,
            y2: b.1,
        }
    }

    /// Rectangle before squaring. `None` for an empty landmark set.
    pub fn rect(&self, padding_factor: f64) -> Option<Rect> {
        match self {
            Region::Box { x1, y1, x2, y2 } => Some(Rect::from_corners((*x1, *y1), (*x2, *y2))),
            Region::Landmarks { points } => padded_landmark_rect(points, padding_factor),
        }
    }

    /// Normalized square crop box. `padding_factor` only applies to landmarks.
    ///
    /// `None` for an empty landmark set or a square that is too large to crop.
    pub fn square_box(&self, padding_factor: f64) -> Option<SquareBox> {
        self.rect(padding_factor).and_then(to_square)
    }
}

/// Pluggable face region detector.
///
/// Implement this trait to feed regions from any landmark or box model
/// into [`crate::Extractor::detect_and_extract`]. A detector that finds
/// nothing, or fails internally, returns an empty list.
pub trait RegionDetector: Send + Sync {
    /// Detect face regions in `image`, in a stable order.
    fn detect(&self, image: &DynamicImage) -> Vec<Region>;
}

/// Read a JSON array of regions, e.g. boxes drawn in an external tool.
pub fn load_regions(path: &Path) -> Result<Vec<Region>, FaceSpliceError> {
    let text = std::fs::read_to_string(path).map_err(|e| FaceSpliceError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| FaceSpliceError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
