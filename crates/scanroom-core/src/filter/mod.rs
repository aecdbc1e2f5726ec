//! Photometric stage: deskew, denoise and the filter stack.
//!
//! Runs on the rectified output of the geometric stage. Every step keeps
//! the image dimensions; only the `GRAY` and `BW` modes change the pixel
//! format (to single-channel [`Gray8`](crate::buffer::PixelFormat::Gray8)).
//!
//! # Step Order
//!
//! 1. Deskew (small-angle rotation, same canvas)
//! 2. Denoise (bilateral smoothing blended by strength)
//! 3. Filter stack: mode, contrast, brightness, sharpen
//!
//! Neutral steps are skipped entirely, so a neutral descriptor leaves the
//! buffer bit for bit unchanged.

mod binarize;
mod blur;
mod denoise;
mod sharpen;
mod tone;

pub use binarize::binarize;
pub use denoise::denoise;
pub use sharpen::unsharp_mask;
pub use tone::{adjust_brightness, adjust_contrast, color_boost, to_gray};

use tracing::debug;

use crate::buffer::ImageBuffer;
use crate::config::PipelineConfig;
use crate::error::EditError;
use crate::ops::{FilterMode, FilterParams, ValidatedOps};
use crate::transform::apply_deskew;

/// Apply the filter stack in order: mode, contrast, brightness, sharpen.
pub fn apply_filter_stack(
    image: ImageBuffer,
    params: &FilterParams,
    config: &PipelineConfig,
) -> Result<ImageBuffer, EditError> {
    let mut image = match params.mode {
        FilterMode::Original => image,
        FilterMode::Gray => to_gray(image)?,
        FilterMode::Bw => binarize(&to_gray(image)?, config.binarize)?,
        FilterMode::ColorBoost => color_boost(&image)?,
    };

    if params.contrast != 1.0 {
        image = adjust_contrast(&image, params.contrast)?;
    }
    if params.brightness != 0.0 {
        image = adjust_brightness(&image, params.brightness)?;
    }
    if params.sharpen > 0.0 {
        image = unsharp_mask(&image, params.sharpen)?;
    }

    Ok(image)
}

/// Run the photometric stage.
///
/// Returns the input buffer unchanged (moved, not copied) when deskew,
/// denoise and the filter stack are all neutral.
///
/// # Errors
///
/// [`EditError::DimensionMismatch`] if a step changes the canvas size.
pub fn apply_photometric(
    mut image: ImageBuffer,
    ops: &ValidatedOps,
    config: &PipelineConfig,
) -> Result<ImageBuffer, EditError> {
    if !ops.needs_photometric() {
        debug!("Photometric stage skipped");
        return Ok(image);
    }

    let dimensions = image.dimensions();
    if ops.has_deskew() {
        image = apply_deskew(&image, ops.deskew() as f64, config.background)?;
        debug!(angle = ops.deskew(), "Deskew done");
    }
    if ops.has_denoise() {
        image = denoise(&image, ops.denoise())?;
        debug!(strength = ops.denoise(), "Denoise done");
    }
    if ops.has_filter() {
        image = apply_filter_stack(image, ops.filter(), config)?;
        debug!(mode = ?ops.filter().mode, format = ?image.format(), "Filter stack done");
    }

    if image.dimensions() != dimensions {
        return Err(EditError::dimension_mismatch(
            format!("{}x{}", dimensions.0, dimensions.1),
            format!("{}x{}", image.width(), image.height()),
        ));
    }
    Ok(image)
}
