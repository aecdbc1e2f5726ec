//! Unsharp-mask sharpening.

use crate::buffer::ImageBuffer;
use crate::error::EditError;
use crate::filter::blur::gaussian_blur;

/// Gain applied at `amount = 1.0`.
const SHARPEN_GAIN: f32 = 1.5;

/// Blur sigma of the mask.
const SHARPEN_SIGMA: f32 = 1.0;

/// Residuals at or below this many levels are left alone.
const SHARPEN_THRESHOLD: f32 = 1.0;

/// Sharpen with an unsharp mask: `p + gain * amount * (p - blur(p))`.
///
/// `amount` is expected in `[0, 1]`; zero returns an identical buffer.
/// Flat areas, where the residual stays within [`SHARPEN_THRESHOLD`], are
/// not touched.
pub fn unsharp_mask(image: &ImageBuffer, amount: f32) -> Result<ImageBuffer, EditError> {
    if amount <= 0.0 {
        return Ok(image.clone());
    }

    let gain = SHARPEN_GAIN * amount;
    let blurred = gaussian_blur(image, SHARPEN_SIGMA)?;
    let pixels = image
        .pixels()
        .iter()
        .zip(blurred.pixels())
        .map(|(&p, &b)| {
            let residual = p as f32 - b as f32;
            if residual.abs() <= SHARPEN_THRESHOLD {
                return p;
            }
            (p as f32 + gain * residual).clamp(0.0, 255.0).round() as u8
        })
        .collect();
    ImageBuffer::new(image.width(), image.height(), image.format(), pixels)
}
