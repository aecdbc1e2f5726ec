//! Luminance helpers using ITU-R BT.709 coefficients.
//!
//! Shared by the gray and black-and-white filter modes, the saturation
//! boost, and background fills for single-channel buffers.

use crate::buffer::PixelFormat;

/// ITU-R BT.709 coefficient for red channel in luminance calculation.
pub const LUMINANCE_R: f32 = 0.2126;

/// ITU-R BT.709 coefficient for green channel in luminance calculation.
pub const LUMINANCE_G: f32 = 0.7152;

/// ITU-R BT.709 coefficient for blue channel in luminance calculation.
pub const LUMINANCE_B: f32 = 0.0722;

/// Luminance of 0-255 channel values, as a float in the same scale.
#[inline]
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    LUMINANCE_R * r + LUMINANCE_G * g + LUMINANCE_B * b
}

/// Luminance of an RGB pixel, rounded to the nearest 8-bit value.
///
/// A neutral pixel (`r == g == b`) maps to its own value.
#[inline]
pub fn luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    luminance(r as f32, g as f32, b as f32).clamp(0.0, 255.0).round() as u8
}

/// Express an RGB fill color in the given pixel format.
///
/// Only the first `format.channels()` entries of the result are meaningful.
pub fn fill_pixel(format: PixelFormat, rgb: [u8; 3]) -> [u8; 3] {
    match format {
        PixelFormat::Rgb8 => rgb,
        PixelFormat::Gray8 => {
            let l = luminance_u8(rgb[0], rgb[1], rgb[2]);
            [l, l, l]
        }
    }
}
