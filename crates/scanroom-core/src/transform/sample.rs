//! Sub-pixel sampling with bilinear and Lanczos3 interpolation.
//!
//! Coordinates are in index space: the centre of pixel `(i, j)` sits at
//! `(i, j)`. A sample is inside the image when it lies within half a pixel
//! of the outermost pixel centres; closer to the border than one full pixel,
//! the edge pixels are replicated.

use serde::{Deserialize, Serialize};

use crate::buffer::ImageBuffer;

/// Tolerance on the half-pixel border, absorbing `f32` rounding in projected coordinates.
const EDGE_EPS: f64 = 1e-3;

/// Interpolation filter for resampling operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationFilter {
    /// Fast bilinear interpolation - good for preview rendering.
    #[default]
    Bilinear,
    /// High-quality Lanczos3 interpolation - good for export.
    Lanczos3,
}

/// Check whether an index-space coordinate falls on the image.
#[inline]
pub(crate) fn in_bounds(image: &ImageBuffer, x: f64, y: f64) -> bool {
    let max_x = image.width() as f64 - 0.5 + EDGE_EPS;
    let max_y = image.height() as f64 - 0.5 + EDGE_EPS;
    let min = -0.5 - EDGE_EPS;
    x >= min && y >= min && x <= max_x && y <= max_y
}

/// Sample `image` at `(x, y)` into `out` (one value per channel).
///
/// Returns `false`, leaving `out` untouched, when the coordinate is outside
/// the image so the caller can apply its background.
pub(crate) fn sample_into(
    image: &ImageBuffer,
    x: f64,
    y: f64,
    filter: InterpolationFilter,
    out: &mut [u8],
) -> bool {
    if !in_bounds(image, x, y) {
        return false;
    }
    match filter {
        InterpolationFilter::Bilinear => sample_bilinear(image, x, y, out),
        InterpolationFilter::Lanczos3 => sample_lanczos3(image, x, y, out),
    }
    true
}

#[inline]
fn channel_f64(image: &ImageBuffer, px: usize, py: usize, c: usize) -> f64 {
    let channels = image.channels();
    image.pixels()[(py * image.width() as usize + px) * channels + c] as f64
}

/// Bilinear interpolation over the four nearest pixels, replicating edges.
fn sample_bilinear(image: &ImageBuffer, x: f64, y: f64, out: &mut [u8]) {
    let max_x = (image.width() - 1) as f64;
    let max_y = (image.height() - 1) as f64;

    let x0f = x.floor().clamp(0.0, max_x);
    let y0f = y.floor().clamp(0.0, max_y);
    let fx = (x - x0f).clamp(0.0, 1.0);
    let fy = (y - y0f).clamp(0.0, 1.0);

    let x0 = x0f as usize;
    let y0 = y0f as usize;
    let x1 = (x0 + 1).min(image.width() as usize - 1);
    let y1 = (y0 + 1).min(image.height() as usize - 1);

    for (c, slot) in out.iter_mut().enumerate().take(image.channels()) {
        let v = channel_f64(image, x0, y0, c) * (1.0 - fx) * (1.0 - fy)
            + channel_f64(image, x1, y0, c) * fx * (1.0 - fy)
            + channel_f64(image, x0, y1, c) * (1.0 - fx) * fy
            + channel_f64(image, x1, y1, c) * fx * fy;
        *slot = v.clamp(0.0, 255.0).round() as u8;
    }
}

/// Lanczos3 interpolation over a 6x6 neighbourhood.
///
/// Falls back to bilinear within the kernel radius of the border.
fn sample_lanczos3(image: &ImageBuffer, x: f64, y: f64, out: &mut [u8]) {
    let (w, h) = (image.width() as i64, image.height() as i64);

    if x < 2.0 || x >= (w - 3) as f64 || y < 2.0 || y >= (h - 3) as f64 {
        sample_bilinear(image, x, y, out);
        return;
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 3];
    let mut weight_sum = 0.0;
    let channels = image.channels();

    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);
            if weight == 0.0 {
                continue;
            }
            for (c, acc) in sum.iter_mut().enumerate().take(channels) {
                *acc += channel_f64(image, px as usize, py as usize, c) * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum > 0.0 {
        for (slot, acc) in out.iter_mut().zip(sum.iter()).take(channels) {
            *slot = (acc / weight_sum).clamp(0.0, 255.0).round() as u8;
        }
    } else {
        sample_bilinear(image, x, y, out);
    }
}

/// Lanczos kernel: `sinc(x) * sinc(x / a)` for `|x| < a`, zero beyond.
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;
    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelFormat;

    fn gradient(width: u32, height: u32) -> ImageBuffer {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| ((x + y) * 8) as u8))
            .collect();
        ImageBuffer::new(width, height, PixelFormat::Gray8, pixels).unwrap()
    }

    fn sample(image: &ImageBuffer, x: f64, y: f64, filter: InterpolationFilter) -> Option<u8> {
        let mut out = [0u8; 3];
        sample_into(image, x, y, filter, &mut out).then_some(out[0])
    }

    #[test]
    fn test_exact_pixel_centres() {
        let img = gradient(10, 10);
        assert_eq!(sample(&img, 3.0, 4.0, InterpolationFilter::Bilinear), Some(56));
        assert_eq!(sample(&img, 5.0, 5.0, InterpolationFilter::Lanczos3), Some(80));
    }

    #[test]
    fn test_bilinear_midpoint() {
        let img = gradient(10, 10);
        // Halfway between (2,2)=32 and (3,2)=40
        assert_eq!(sample(&img, 2.5, 2.0, InterpolationFilter::Bilinear), Some(36));
    }

    #[test]
    fn test_near_rounding_snaps_to_pixel() {
        let img = gradient(10, 10);
        assert_eq!(
            sample(&img, 3.0 - 1e-10, 4.0 + 1e-10, InterpolationFilter::Bilinear),
            Some(56)
        );
    }

    #[test]
    fn test_half_pixel_border_is_inside() {
        let img = gradient(4, 4);
        assert_eq!(sample(&img, -0.5, -0.5, InterpolationFilter::Bilinear), Some(0));
        assert_eq!(sample(&img, 3.5, 3.5, InterpolationFilter::Bilinear), Some(48));
        assert_eq!(sample(&img, -0.6, 1.0, InterpolationFilter::Bilinear), None);
        assert_eq!(sample(&img, 1.0, 3.6, InterpolationFilter::Bilinear), None);
    }

    #[test]
    fn test_rgb_channels_sampled_independently() {
        let img = ImageBuffer::new(2, 1, PixelFormat::Rgb8, vec![0, 100, 200, 100, 200, 0]).unwrap();
        let mut out = [0u8; 3];
        assert!(sample_into(&img, 0.5, 0.0, InterpolationFilter::Bilinear, &mut out));
        assert_eq!(out, [50, 150, 100]);
    }

    #[test]
    fn test_lanczos_weight_at_zero() {
        let w = lanczos_weight(0.0, 3.0);
        assert!((w - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lanczos_weight_at_boundary() {
        let w = lanczos_weight(3.0, 3.0);
        assert!(w.abs() < f64::EPSILON);
    }

    #[test]
    fn test_lanczos_weight_symmetry() {
        let w1 = lanczos_weight(1.5, 3.0);
        let w2 = lanczos_weight(-1.5, 3.0);
        assert!((w1 - w2).abs() < 1e-10);
    }

    #[test]
    fn test_lanczos_small_image_fallback() {
        let img = gradient(4, 4);
        assert_eq!(
            sample(&img, 1.5, 1.0, InterpolationFilter::Lanczos3),
            sample(&img, 1.5, 1.0, InterpolationFilter::Bilinear)
        );
    }
}
