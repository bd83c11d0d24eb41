use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::face_detector::Landmark;

/// Default landmark padding: the box grows by its own width and height on
/// each side, so the landmarks occupy the central half.
pub const DEFAULT_PADDING_FACTOR: f64 = 1.0;

/// Largest square side accepted when normalizing a region.
pub const MAX_CROP_SIDE: u32 = 1 << 15;

/// Axis-aligned rectangle in source-image pixels, corners ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Build a rectangle from two arbitrary corners.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        Rect {
            x1: a.0.min(b.0),
            y1: a.1.min(b.1),
            x2: a.0.max(b.0),
            y2: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> i64 {
        self.x2 as i64 - self.x1 as i64
    }

    pub fn height(&self) -> i64 {
        self.y2 as i64 - self.y1 as i64
    }
}

/// Square crop box in source-image pixels.
///
/// Coordinates may be negative or lie past the image edge; cropping fills
/// those areas with transparent pixels. Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct SquareBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl SquareBox {
    /// Side length in pixels.
    pub fn side(&self) -> u32 {
        (self.x2 as i64 - self.x1 as i64).clamp(0, u32::MAX as i64) as u32
    }

    pub fn top_left(&self) -> (i32, i32) {
        (self.x1, self.y1)
    }

    pub fn is_square(&self) -> bool {
        self.x2 as i64 - self.x1 as i64 == self.y2 as i64 - self.y1 as i64
    }
}

impl From<[i32; 4]> for SquareBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        SquareBox { x1, y1, x2, y2 }
    }
}

impl From<SquareBox> for [i32; 4] {
    fn from(b: SquareBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Bounding rectangle of `points`, expanded by `padding_factor × width`
/// horizontally and `padding_factor × height` vertically on each side.
///
/// Returns `None` for an empty point set, or when the padded rectangle does
/// not fit in `i32` coordinates.
pub fn padded_landmark_rect(points: &[Landmark], padding_factor: f64) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    // Bounds truncate toward zero before padding.
    let (min_x, min_y, max_x, max_y) = (min_x as i32, min_y as i32, max_x as i32, max_y as i32);
    let pad_x = ((max_x as f64 - min_x as f64) * padding_factor) as i32;
    let pad_y = ((max_y as f64 - min_y as f64) * padding_factor) as i32;

    Some(Rect {
        x1: min_x.checked_sub(pad_x)?,
        y1: min_y.checked_sub(pad_y)?,
        x2: max_x.checked_add(pad_x)?,
        y2: max_y.checked_add(pad_y)?,
    })
}

/// Square of side `max(width, height)` centred on `rect`.
///
/// The top-left corner truncates toward zero; the far corner is derived from
/// the side so the result is always exactly square. Returns `None` when the
/// side exceeds [`MAX_CROP_SIDE`] or the square leaves `i32` coordinates.
pub fn to_square(rect: Rect) -> Option<SquareBox> {
    let side = rect.width().max(rect.height());
    if side > MAX_CROP_SIDE as i64 {
        return None;
    }

    let width = rect.width() as f64;
    let height = rect.height() as f64;
    let center_x = rect.x1 as f64 + width / 2.0;
    let center_y = rect.y1 as f64 + height / 2.0;
    let half = side as f64 / 2.0;

    let x1 = i32::try_from((center_x - half) as i64).ok()?;
    let y1 = i32::try_from((center_y - half) as i64).ok()?;
    let side = side as i32;

    Some(SquareBox {
        x1,
        y1,
        x2: x1.checked_add(side)?,
        y2: y1.checked_add(side)?,
    })
}

/// Crop `square` out of `source`, padding out-of-bounds pixels with
/// transparent black. The result is always `side × side`.
pub fn crop_square(source: &RgbaImage, square: &SquareBox) -> RgbaImage {
    let side = square.side();
    let mut canvas = RgbaImage::new(side, side);
    imageops::replace(
        &mut canvas,
        source,
        -(square.x1 as i64),
        -(square.y1 as i64),
    );
    canvas
}
