//! The edit-operations descriptor.
//!
//! [`EditOps`] is the raw, serializable description of the edits requested
//! for one document page. It is what the UI layer builds from corner drags
//! and slider values, and what the record store persists next to the page.
//! It carries no behavior beyond classification predicates and builders.
//!
//! Before any pixel work the descriptor is turned into a [`ValidatedOps`] by
//! [`validate`], which rejects structurally invalid input, clamps numeric
//! parameters and derives the homography from the crop quadrilateral.
//!
//! # Serialized shape
//!
//! ```text
//! {
//!   "crop": [{"x": 10.0, "y": 10.0}, ...] | null,
//!   "warp": [h00, h01, h02, h10, h11, h12, h20, h21, h22] | null,
//!   "rotate": 0 | 90 | 180 | 270,
//!   "filter": {"mode": "ORIGINAL", "contrast": 1.0, "brightness": 0.0, "sharpen": 0.0},
//!   "denoise": 0.0,
//!   "deskew": 0.0
//! }
//! ```

mod validate;

pub use validate::{validate, Quad, ValidatedOps, WarpSpec};

use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// Allowed range of `filter.contrast`.
pub const CONTRAST_RANGE: (f32, f32) = (0.0, 2.0);
/// Allowed range of `filter.brightness`.
pub const BRIGHTNESS_RANGE: (f32, f32) = (-1.0, 1.0);
/// Allowed range of `filter.sharpen`.
pub const SHARPEN_RANGE: (f32, f32) = (0.0, 1.0);
/// Allowed range of `denoise`.
pub const DENOISE_RANGE: (f32, f32) = (0.0, 1.0);
/// Allowed range of `deskew`, in degrees.
pub const DESKEW_RANGE: (f32, f32) = (-45.0, 45.0);

/// A point in source-image pixel coordinates.
///
/// Pixel `(i, j)` covers the square `[i, i+1) x [j, j+1)`, so a crop from
/// `(10, 10)` to `(90, 90)` spans exactly 80 pixels on each axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Color treatment applied as the first step of the filter stack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterMode {
    /// Leave colors untouched.
    #[default]
    Original,
    /// Desaturate to a single luminance channel.
    Gray,
    /// Desaturate and binarize to pure black and white.
    Bw,
    /// Boost saturation and local contrast.
    ColorBoost,
}

/// Filter stack parameters: mode, then contrast, brightness and sharpen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub mode: FilterMode,
    /// Contrast multiplier around mid-gray (0.0 to 2.0, neutral 1.0)
    pub contrast: f32,
    /// Brightness offset as a fraction of full scale (-1.0 to 1.0, neutral 0.0)
    pub brightness: f32,
    /// Unsharp-mask strength (0.0 to 1.0, neutral 0.0)
    pub sharpen: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            mode: FilterMode::Original,
            contrast: 1.0,
            brightness: 0.0,
            sharpen: 0.0,
        }
    }
}

impl FilterParams {
    /// Check if every filter step is the identity.
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Coarse clockwise rotation in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QuarterTurn {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl QuarterTurn {
    /// Parse a rotation in degrees; only 0, 90, 180 and 270 are accepted.
    pub fn from_degrees(degrees: i32) -> Result<Self, EditError> {
        match degrees {
            0 => Ok(QuarterTurn::None),
            90 => Ok(QuarterTurn::Cw90),
            180 => Ok(QuarterTurn::Cw180),
            270 => Ok(QuarterTurn::Cw270),
            other => Err(EditError::InvalidRotation(other)),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            QuarterTurn::None => 0,
            QuarterTurn::Cw90 => 90,
            QuarterTurn::Cw180 => 180,
            QuarterTurn::Cw270 => 270,
        }
    }

    /// Returns true if this rotation swaps width and height.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, QuarterTurn::Cw90 | QuarterTurn::Cw270)
    }
}

/// Raw edit-operations descriptor for one page.
///
/// Values are taken as supplied; range clamping and geometry checks happen
/// in [`validate`]. Missing fields deserialize to their neutral values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditOps {
    /// Crop quadrilateral: top-left, top-right, bottom-right, bottom-left,
    /// clockwise on screen.
    pub crop: Option<Vec<Point>>,
    /// Row-major 3x3 homography from source to output coordinates.
    pub warp: Option<[f64; 9]>,
    /// Clockwise rotation in degrees (0, 90, 180 or 270).
    pub rotate: i32,
    pub filter: FilterParams,
    /// Denoise strength (0.0 to 1.0)
    pub denoise: f32,
    /// Fine rotation in degrees, positive = counter-clockwise (-45.0 to 45.0)
    pub deskew: f32,
}

impl EditOps {
    /// Create a neutral descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_crop(&self) -> bool {
        self.crop.is_some()
    }

    pub fn has_warp(&self) -> bool {
        self.warp.is_some()
    }

    pub fn has_rotation(&self) -> bool {
        self.rotate != 0
    }

    pub fn has_filter(&self) -> bool {
        !self.filter.is_neutral()
    }

    pub fn has_denoise(&self) -> bool {
        self.denoise != 0.0
    }

    pub fn has_deskew(&self) -> bool {
        self.deskew != 0.0
    }

    /// Check if any stage has work to do.
    pub fn has_any_edit_ops(&self) -> bool {
        self.has_crop()
            || self.has_warp()
            || self.has_rotation()
            || self.has_filter()
            || self.has_denoise()
            || self.has_deskew()
    }

    /// Return every field to its neutral value.
    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn with_crop(mut self, corners: [Point; 4]) -> Self {
        self.crop = Some(corners.to_vec());
        self
    }

    #[must_use]
    pub fn with_warp(mut self, matrix: [f64; 9]) -> Self {
        self.warp = Some(matrix);
        self
    }

    #[must_use]
    pub fn with_rotate(mut self, degrees: i32) -> Self {
        self.rotate = degrees;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterParams) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_denoise(mut self, strength: f32) -> Self {
        self.denoise = strength;
        self
    }

    #[must_use]
    pub fn with_deskew(mut self, degrees: f32) -> Self {
        self.deskew = degrees;
        self
    }
}
