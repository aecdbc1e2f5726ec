//! Black-and-white thresholding for scanned text.
//!
//! Operates on single-channel buffers and always produces values in {0, 255}.

use crate::buffer::{ImageBuffer, PixelFormat};
use crate::config::BinarizeMethod;
use crate::error::EditError;

/// Binarize a gray buffer with the configured method.
pub fn binarize(gray: &ImageBuffer, method: BinarizeMethod) -> Result<ImageBuffer, EditError> {
    if gray.format() != PixelFormat::Gray8 {
        return Err(EditError::UnsupportedPixelFormat(format!(
            "binarization expects Gray8, got {:?}",
            gray.format()
        )));
    }

    let pixels = match method {
        BinarizeMethod::Fixed(threshold) => threshold_global(gray.pixels(), |v| v < threshold),
        BinarizeMethod::Otsu => {
            let t = otsu_threshold(gray.pixels());
            threshold_global(gray.pixels(), |v| v <= t)
        }
        BinarizeMethod::Adaptive { block_radius, c } => adaptive(gray, block_radius, c),
    };
    ImageBuffer::new(gray.width(), gray.height(), PixelFormat::Gray8, pixels)
}

fn threshold_global(pixels: &[u8], is_black: impl Fn(u8) -> bool) -> Vec<u8> {
    pixels
        .iter()
        .map(|&v| if is_black(v) { 0 } else { 255 })
        .collect()
}

/// Pixels darker than their local mean minus `c` become black.
fn adaptive(gray: &ImageBuffer, block_radius: u32, c: i32) -> Vec<u8> {
    let (width, height) = gray.dimensions();
    let integral = IntegralImage::new(gray);

    let mut output = Vec::with_capacity(gray.byte_size());
    for y in 0..height {
        for x in 0..width {
            let local_mean = integral.region_mean(x, y, block_radius);
            let threshold = (local_mean.round() as i32 - c).clamp(0, 255);
            let value = gray.pixel(x, y)[0] as i32;
            output.push(if value < threshold { 0 } else { 255 });
        }
    }
    output
}

/// Summed-area table with a zero-padded first row and column.
struct IntegralImage {
    table: Vec<u64>,
    width: u32,
    height: u32,
}

impl IntegralImage {
    fn new(gray: &ImageBuffer) -> Self {
        let (w, h) = gray.dimensions();
        let stride = (w + 1) as usize;
        let mut table = vec![0u64; stride * (h + 1) as usize];

        for y in 0..h {
            let mut row_sum: u64 = 0;
            for x in 0..w {
                row_sum += gray.pixel(x, y)[0] as u64;
                let idx = (y + 1) as usize * stride + (x + 1) as usize;
                let above = y as usize * stride + (x + 1) as usize;
                table[idx] = row_sum + table[above];
            }
        }

        Self {
            table,
            width: w,
            height: h,
        }
    }

    /// Mean over the square of the given radius around `(cx, cy)`, clipped
    /// to the image.
    fn region_mean(&self, cx: u32, cy: u32, radius: u32) -> f64 {
        let stride = (self.width + 1) as usize;
        let x1 = cx.saturating_sub(radius) as usize;
        let y1 = cy.saturating_sub(radius) as usize;
        let x2 = (cx as usize + radius as usize + 1).min(self.width as usize);
        let y2 = (cy as usize + radius as usize + 1).min(self.height as usize);

        let area = ((x2 - x1) * (y2 - y1)) as f64;
        let t = &self.table;
        let sum = t[y2 * stride + x2] + t[y1 * stride + x1] - t[y1 * stride + x2] - t[y2 * stride + x1];
        sum as f64 / area
    }
}

/// Otsu threshold: the level that maximizes between-class variance.
///
/// Pixels at or below the returned level form the dark class.
pub(crate) fn otsu_threshold(pixels: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &v in pixels {
        histogram[v as usize] += 1;
    }

    let total = pixels.len() as u64;
    let sum_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| i as f64 * count as f64)
        .sum();

    let mut sum_dark = 0.0f64;
    let mut weight_dark = 0u64;
    let mut best_variance = 0.0f64;
    let mut best_threshold = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        weight_dark += count;
        if weight_dark == 0 {
            continue;
        }
        let weight_light = total - weight_dark;
        if weight_light == 0 {
            break;
        }

        sum_dark += t as f64 * count as f64;
        let mean_dark = sum_dark / weight_dark as f64;
        let mean_light = (sum_total - sum_dark) / weight_light as f64;
        let variance =
            weight_dark as f64 * weight_light as f64 * (mean_dark - mean_light).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}
