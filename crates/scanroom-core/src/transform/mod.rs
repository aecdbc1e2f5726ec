//! Geometric stage: perspective crop and coarse rotation.
//!
//! This stage runs before any photometric processing and turns the source
//! image into an axis-aligned, rectified rectangle.
//!
//! # Transform Order
//!
//! 1. Homography warp (crop quadrilateral to rectangle, perspective fused in)
//! 2. Quarter-turn rotation (exact pixel permutation)
//!
//! # Coordinate System
//!
//! - Crop points are in source pixel coordinates; pixel `(i, j)` covers
//!   `[i, i+1) x [j, j+1)`
//! - Coarse rotation is clockwise; deskew angles are counter-clockwise
//! - Origin is top-left corner

mod homography;
mod rotation;
mod sample;
mod warp;

pub use homography::Homography;
pub use rotation::{apply_deskew, rotate_quarter};
pub use sample::InterpolationFilter;
pub use warp::{apply_warp, compute_warp_bounds, warp_projection};

use tracing::debug;

use crate::buffer::ImageBuffer;
use crate::config::PipelineConfig;
use crate::error::EditError;
use crate::ops::ValidatedOps;

/// Run the geometric stage.
///
/// Returns the input buffer unchanged (moved, not copied) when the
/// descriptor has neither a warp nor a rotation.
///
/// # Errors
///
/// [`EditError::DegenerateTransform`] for a non-invertible warp and
/// [`EditError::DimensionMismatch`] if a step produces a canvas that breaks
/// its size contract.
pub fn apply_geometric(
    image: ImageBuffer,
    ops: &ValidatedOps,
    config: &PipelineConfig,
) -> Result<ImageBuffer, EditError> {
    if !ops.needs_geometric() {
        debug!("Geometric stage skipped");
        return Ok(image);
    }

    let warped = match ops.warp() {
        Some(warp) => {
            let out = apply_warp(&image, warp, config)?;
            if let Some((w, h)) = warp.output_size {
                if out.dimensions() != (w, h) {
                    return Err(EditError::dimension_mismatch(
                        format!("{w}x{h}"),
                        format!("{}x{}", out.width(), out.height()),
                    ));
                }
            }
            out
        }
        None => image,
    };

    let (w, h) = warped.dimensions();
    let turn = ops.rotate();
    let rotated = rotate_quarter(warped, turn)?;
    let expected = if turn.swaps_dimensions() { (h, w) } else { (w, h) };
    if rotated.dimensions() != expected {
        return Err(EditError::dimension_mismatch(
            format!("{}x{}", expected.0, expected.1),
            format!("{}x{}", rotated.width(), rotated.height()),
        ));
    }

    Ok(rotated)
}
