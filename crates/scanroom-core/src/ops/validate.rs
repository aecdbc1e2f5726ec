//! Validation and normalization of edit-operations descriptors.
//!
//! [`validate`] is a pure function from a raw [`EditOps`] to a
//! [`ValidatedOps`]. All structural checks happen here so the pipeline can
//! reject a request before touching any pixels:
//!
//! - the crop must be a convex quadrilateral with four distinct corners,
//!   listed clockwise on screen from the top-left
//! - rotation must be a multiple of 90 degrees in `0..360`
//! - an explicit warp matrix must be finite and invertible
//!
//! Numeric parameters are clamped into range instead of rejected. NaN is
//! replaced by the parameter's neutral value.

use tracing::warn;

use super::{
    EditOps, FilterParams, Point, QuarterTurn, BRIGHTNESS_RANGE, CONTRAST_RANGE, DENOISE_RANGE,
    DESKEW_RANGE, SHARPEN_RANGE,
};
use crate::error::EditError;
use crate::transform::Homography;

/// Minimum distance between two crop corners, in pixels.
const MIN_CORNER_DISTANCE: f64 = 1e-6;

/// Relative tolerance for treating three corners as collinear.
const COLLINEAR_EPS: f64 = 1e-9;

/// A validated crop quadrilateral: convex, non-degenerate, corners ordered
/// top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    corners: [Point; 4],
}

impl Quad {
    /// Check and wrap a list of corners.
    pub fn new(points: &[Point]) -> Result<Self, EditError> {
        let corners: [Point; 4] = points.try_into().map_err(|_| {
            EditError::InvalidGeometry(format!("expected 4 crop points, got {}", points.len()))
        })?;

        if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(EditError::InvalidGeometry(
                "crop points must be finite".to_string(),
            ));
        }

        for i in 0..4 {
            for j in (i + 1)..4 {
                if corners[i].distance(corners[j]) < MIN_CORNER_DISTANCE {
                    return Err(EditError::InvalidGeometry(format!(
                        "crop points {i} and {j} coincide"
                    )));
                }
            }
        }

        // Turn direction at each corner. A convex outline turns the same way
        // at all four corners.
        let mut turns = [0.0f64; 4];
        for (i, turn) in turns.iter_mut().enumerate() {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let c = corners[(i + 2) % 4];
            let cross = cross(a, b, c);
            if cross.abs() <= COLLINEAR_EPS * a.distance(b) * b.distance(c) {
                return Err(EditError::InvalidGeometry(format!(
                    "crop points {i}, {}, {} are collinear",
                    (i + 1) % 4,
                    (i + 2) % 4
                )));
            }
            *turn = cross;
        }

        if segments_intersect(corners[0], corners[1], corners[2], corners[3])
            || segments_intersect(corners[1], corners[2], corners[3], corners[0])
        {
            return Err(EditError::InvalidGeometry(
                "crop quadrilateral is self-intersecting".to_string(),
            ));
        }

        // With y pointing down, top-left, top-right, bottom-right, bottom-left
        // turns positive at every corner.
        let positive = turns.iter().filter(|t| **t > 0.0).count();
        if positive != 0 && positive != 4 {
            return Err(EditError::InvalidGeometry(
                "crop quadrilateral is concave".to_string(),
            ));
        }
        if positive == 0 {
            return Err(EditError::InvalidGeometry(
                "crop corners run counter-clockwise; expected top-left, top-right, \
                 bottom-right, bottom-left"
                    .to_string(),
            ));
        }

        Ok(Self { corners })
    }

    pub fn corners(&self) -> &[Point; 4] {
        &self.corners
    }

    /// Output rectangle size for this quadrilateral.
    ///
    /// Width is the longer of the top and bottom edges, height the longer of
    /// the left and right edges, so the physical document keeps its aspect
    /// ratio after rectification.
    pub fn target_size(&self) -> (u32, u32) {
        let [tl, tr, br, bl] = self.corners;
        let width = tl.distance(tr).max(bl.distance(br));
        let height = tl.distance(bl).max(tr.distance(br));
        (to_extent(width), to_extent(height))
    }
}

fn to_extent(length: f64) -> u32 {
    length.round().clamp(1.0, u32::MAX as f64) as u32
}

/// z component of `(b - a) x (c - b)`.
#[inline]
fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x)
}

/// Orientation of `c` relative to the directed line `a -> b`.
#[inline]
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// True if segments `p1-p2` and `p3-p4` cross at a point interior to both.
fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let d1 = orient(p3, p4, p1);
    let d2 = orient(p3, p4, p2);
    let d3 = orient(p1, p2, p3);
    let d4 = orient(p1, p2, p4);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// The geometric warp to apply, with the output canvas size when known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpSpec {
    /// Maps source coordinates to output coordinates.
    pub homography: Homography,
    /// Output size derived from the crop. `None` for an explicit warp,
    /// whose canvas is sized from the projected source corners.
    pub output_size: Option<(u32, u32)>,
    /// Source quadrilateral the warp was derived from, if any.
    pub quad: Option<Quad>,
}

/// A descriptor that passed validation. Immutable; build a new one per request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOps {
    crop: Option<Quad>,
    warp: Option<WarpSpec>,
    rotate: QuarterTurn,
    filter: FilterParams,
    denoise: f32,
    deskew: f32,
}

impl Default for ValidatedOps {
    fn default() -> Self {
        Self {
            crop: None,
            warp: None,
            rotate: QuarterTurn::None,
            filter: FilterParams::default(),
            denoise: 0.0,
            deskew: 0.0,
        }
    }
}

impl ValidatedOps {
    pub fn crop(&self) -> Option<&Quad> {
        self.crop.as_ref()
    }

    pub fn warp(&self) -> Option<&WarpSpec> {
        self.warp.as_ref()
    }

    pub fn rotate(&self) -> QuarterTurn {
        self.rotate
    }

    pub fn filter(&self) -> &FilterParams {
        &self.filter
    }

    pub fn denoise(&self) -> f32 {
        self.denoise
    }

    pub fn deskew(&self) -> f32 {
        self.deskew
    }

    pub fn has_crop(&self) -> bool {
        self.crop.is_some()
    }

    pub fn has_warp(&self) -> bool {
        self.warp.is_some()
    }

    pub fn has_rotation(&self) -> bool {
        self.rotate != QuarterTurn::None
    }

    pub fn has_filter(&self) -> bool {
        !self.filter.is_neutral()
    }

    pub fn has_denoise(&self) -> bool {
        self.denoise > 0.0
    }

    pub fn has_deskew(&self) -> bool {
        self.deskew != 0.0
    }

    /// Check if the geometric stage has work to do.
    pub fn needs_geometric(&self) -> bool {
        self.has_warp() || self.has_rotation()
    }

    /// Check if the photometric stage has work to do.
    pub fn needs_photometric(&self) -> bool {
        self.has_deskew() || self.has_denoise() || self.has_filter()
    }

    pub fn has_any_edit_ops(&self) -> bool {
        self.has_crop() || self.needs_geometric() || self.needs_photometric()
    }

    /// Normalized raw form: clamped values and the derived warp filled in.
    ///
    /// This is what a caller should persist after validation, so the stored
    /// descriptor reproduces the same output.
    pub fn to_edit_ops(&self) -> EditOps {
        EditOps {
            crop: self.crop.map(|q| q.corners.to_vec()),
            warp: self.warp.map(|w| w.homography.to_array()),
            rotate: self.rotate.degrees(),
            filter: self.filter,
            denoise: self.denoise,
            deskew: self.deskew,
        }
    }
}

fn clamp_param(value: f32, (min, max): (f32, f32), neutral: f32) -> f32 {
    if value.is_nan() {
        neutral
    } else {
        value.clamp(min, max)
    }
}

/// Validate and normalize a raw descriptor.
///
/// # Errors
///
/// - [`EditError::InvalidGeometry`] for a crop that is not a convex
///   quadrilateral with four distinct, finite corners
/// - [`EditError::InvalidRotation`] for `rotate` outside {0, 90, 180, 270}
/// - [`EditError::DegenerateTransform`] for a warp that cannot be inverted
pub fn validate(ops: &EditOps) -> Result<ValidatedOps, EditError> {
    let rotate = QuarterTurn::from_degrees(ops.rotate)?;

    let crop = ops.crop.as_deref().map(Quad::new).transpose()?;

    // The crop is authoritative: when present, the warp is always derived
    // from it, even if the caller also supplied a matrix.
    let warp = match (crop, ops.warp) {
        (Some(quad), _) => {
            let (width, height) = quad.target_size();
            let homography =
                Homography::from_quad_to_rect(quad.corners(), width as f64, height as f64)?;
            Some(WarpSpec {
                homography,
                output_size: Some((width, height)),
                quad: Some(quad),
            })
        }
        (None, Some(matrix)) => Some(WarpSpec {
            homography: Homography::from_row_major(matrix)?,
            output_size: None,
            quad: None,
        }),
        (None, None) => None,
    };

    let filter = FilterParams {
        mode: ops.filter.mode,
        contrast: clamp_param(ops.filter.contrast, CONTRAST_RANGE, 1.0),
        brightness: clamp_param(ops.filter.brightness, BRIGHTNESS_RANGE, 0.0),
        sharpen: clamp_param(ops.filter.sharpen, SHARPEN_RANGE, 0.0),
    };
    if filter != ops.filter {
        warn!(requested = ?ops.filter, clamped = ?filter, "Filter parameters clamped");
    }

    Ok(ValidatedOps {
        crop,
        warp,
        rotate,
        filter,
        denoise: clamp_param(ops.denoise, DENOISE_RANGE, 0.0),
        deskew: clamp_param(ops.deskew, DESKEW_RANGE, 0.0),
    })
}
