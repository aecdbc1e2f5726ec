//! Per-pixel tone operations of the filter stack.
//!
//! Contrast and brightness are applied through 256-entry lookup tables,
//! so every channel value maps through the same clamped formula:
//!
//! - contrast: `clamp((p - 128) * contrast + 128)`
//! - brightness: `clamp(p + brightness * 255)`

use crate::buffer::{ImageBuffer, PixelFormat};
use crate::error::EditError;
use crate::filter::blur::gaussian_blur;
use crate::luminance::{luminance, luminance_u8};

/// Saturation multiplier applied by the color-boost mode.
const BOOST_SATURATION: f32 = 1.35;

/// Blur radius (sigma) defining "local" for the color-boost contrast lift.
const BOOST_LOCAL_SIGMA: f32 = 6.0;

/// Strength of the color-boost local contrast lift.
const BOOST_LOCAL_AMOUNT: f32 = 0.3;

/// Collapse to a single luminance channel.
///
/// A buffer that is already gray is returned as-is.
pub fn to_gray(image: ImageBuffer) -> Result<ImageBuffer, EditError> {
    if image.format() == PixelFormat::Gray8 {
        return Ok(image);
    }
    let gray: Vec<u8> = image
        .pixels()
        .chunks_exact(3)
        .map(|px| luminance_u8(px[0], px[1], px[2]))
        .collect();
    ImageBuffer::new(image.width(), image.height(), PixelFormat::Gray8, gray)
}

/// Map every channel value through `lut`.
fn apply_lut(image: &ImageBuffer, lut: &[u8; 256]) -> Result<ImageBuffer, EditError> {
    let pixels = image.pixels().iter().map(|&v| lut[v as usize]).collect();
    ImageBuffer::new(image.width(), image.height(), image.format(), pixels)
}

fn build_lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = f(i as f32).clamp(0.0, 255.0).round() as u8;
    }
    lut
}

/// Scale contrast around mid-gray (128).
pub fn adjust_contrast(image: &ImageBuffer, contrast: f32) -> Result<ImageBuffer, EditError> {
    let lut = build_lut(|p| (p - 128.0) * contrast + 128.0);
    apply_lut(image, &lut)
}

/// Shift brightness by a fraction of full scale.
pub fn adjust_brightness(image: &ImageBuffer, brightness: f32) -> Result<ImageBuffer, EditError> {
    let lut = build_lut(|p| p + brightness * 255.0);
    apply_lut(image, &lut)
}

/// Boost saturation and local contrast.
///
/// Saturation is pushed away from each pixel's luminance, so colors get
/// stronger and neutral grays stay neutral. Local contrast then adds a
/// fraction of the difference between the pixel and a wide Gaussian blur.
pub fn color_boost(image: &ImageBuffer) -> Result<ImageBuffer, EditError> {
    let saturated = match image.format() {
        PixelFormat::Gray8 => image.clone(),
        PixelFormat::Rgb8 => {
            let mut pixels = Vec::with_capacity(image.byte_size());
            for px in image.pixels().chunks_exact(3) {
                let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
                let l = luminance(r, g, b);
                for c in [r, g, b] {
                    let boosted = l + (c - l) * BOOST_SATURATION;
                    pixels.push(boosted.clamp(0.0, 255.0).round() as u8);
                }
            }
            ImageBuffer::new(image.width(), image.height(), PixelFormat::Rgb8, pixels)?
        }
    };

    let blurred = gaussian_blur(&saturated, BOOST_LOCAL_SIGMA)?;
    let pixels = saturated
        .pixels()
        .iter()
        .zip(blurred.pixels())
        .map(|(&p, &b)| {
            let p = p as f32;
            (p + BOOST_LOCAL_AMOUNT * (p - b as f32)).clamp(0.0, 255.0).round() as u8
        })
        .collect();
    ImageBuffer::new(saturated.width(), saturated.height(), saturated.format(), pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saturation(px: &[u8]) -> u8 {
        px.iter().max().unwrap() - px.iter().min().unwrap()
    }

    #[test]
    fn test_to_gray_collapses_channels() {
        let img = ImageBuffer::filled(4, 4, PixelFormat::Rgb8, &[90, 90, 90]).unwrap();
        let gray = to_gray(img).unwrap();
        assert_eq!(gray.format(), PixelFormat::Gray8);
        assert_eq!(gray.byte_size(), 16);
        assert!(gray.pixels().iter().all(|&v| v == 90));
    }

    #[test]
    fn test_to_gray_passes_gray_through() {
        let img = ImageBuffer::new(2, 1, PixelFormat::Gray8, vec![3, 4]).unwrap();
        assert_eq!(to_gray(img.clone()).unwrap(), img);
    }

    #[test]
    fn test_neutral_contrast_and_brightness_are_identity() {
        let pixels: Vec<u8> = (0..=255).collect();
        let img = ImageBuffer::new(256, 1, PixelFormat::Gray8, pixels).unwrap();
        assert_eq!(adjust_contrast(&img, 1.0).unwrap(), img);
        assert_eq!(adjust_brightness(&img, 0.0).unwrap(), img);
    }

    #[test]
    fn test_contrast_formula() {
        let img = ImageBuffer::new(3, 1, PixelFormat::Gray8, vec![28, 128, 228]).unwrap();
        let out = adjust_contrast(&img, 2.0).unwrap();
        // (28-128)*2+128 = -72 -> 0; (228-128)*2+128 = 328 -> 255
        assert_eq!(out.pixels(), &[0, 128, 255]);

        let out = adjust_contrast(&img, 0.5).unwrap();
        assert_eq!(out.pixels(), &[78, 128, 178]);

        let out = adjust_contrast(&img, 0.0).unwrap();
        assert_eq!(out.pixels(), &[128, 128, 128]);
    }

    #[test]
    fn test_brightness_formula() {
        let img = ImageBuffer::new(2, 1, PixelFormat::Gray8, vec![10, 200]).unwrap();
        assert_eq!(adjust_brightness(&img, 0.2).unwrap().pixels(), &[61, 251]);
        assert_eq!(adjust_brightness(&img, -1.0).unwrap().pixels(), &[0, 0]);
        assert_eq!(adjust_brightness(&img, 1.0).unwrap().pixels(), &[255, 255]);
    }

    #[test]
    fn test_color_boost_increases_saturation() {
        let img = ImageBuffer::filled(8, 8, PixelFormat::Rgb8, &[160, 110, 90]).unwrap();
        let out = color_boost(&img).unwrap();
        assert_eq!(out.format(), PixelFormat::Rgb8);
        assert!(saturation(out.pixel(4, 4)) > saturation(img.pixel(4, 4)));
    }

    #[test]
    fn test_color_boost_keeps_neutral_gray() {
        let img = ImageBuffer::filled(8, 8, PixelFormat::Rgb8, &[120, 120, 120]).unwrap();
        let out = color_boost(&img).unwrap();
        assert!(out.pixels().iter().all(|&v| v == 120));
    }

    #[test]
    fn test_color_boost_lifts_local_contrast() {
        // Dark stripe on a light field gets darker; the field next to it lighter.
        let pixels = (0..20)
            .flat_map(|_y| (0..20).map(|x| if (8..12).contains(&x) { 60u8 } else { 180u8 }))
            .collect();
        let img = ImageBuffer::new(20, 20, PixelFormat::Gray8, pixels).unwrap();
        let out = color_boost(&img).unwrap();

        assert!(out.pixel(10, 10)[0] < 60);
        assert!(out.pixel(6, 10)[0] > 180);
    }
}
