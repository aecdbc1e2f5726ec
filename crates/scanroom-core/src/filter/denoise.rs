//! Edge-preserving noise reduction.
//!
//! A bilateral filter produces the fully denoised image; the requested
//! strength then blends between the source and that result:
//!
//! ```text
//! out = p + strength * (bilateral(p) - p)
//! ```
//!
//! Range distance is measured jointly over all channels so color edges are
//! kept intact rather than smeared per channel.

use crate::buffer::ImageBuffer;
use crate::error::EditError;

const RADIUS: i64 = 2;
const SIGMA_SPATIAL: f32 = 1.5;
const SIGMA_RANGE: f32 = 40.0;

/// Reduce noise with the given strength in `[0, 1]`.
///
/// Zero strength returns an identical buffer.
pub fn denoise(image: &ImageBuffer, strength: f32) -> Result<ImageBuffer, EditError> {
    if strength <= 0.0 {
        return Ok(image.clone());
    }
    let strength = strength.min(1.0);

    let filtered = bilateral(image);
    let pixels = image
        .pixels()
        .iter()
        .zip(filtered.iter())
        .map(|(&p, &f)| {
            let p = p as f32;
            (p + strength * (f - p)).clamp(0.0, 255.0).round() as u8
        })
        .collect();
    ImageBuffer::new(image.width(), image.height(), image.format(), pixels)
}

fn bilateral(image: &ImageBuffer) -> Vec<f32> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let channels = image.channels();
    let src = image.pixels();

    let side = (2 * RADIUS + 1) as usize;
    let mut spatial = vec![0.0f32; side * side];
    for dy in -RADIUS..=RADIUS {
        for dx in -RADIUS..=RADIUS {
            let d2 = (dx * dx + dy * dy) as f32;
            spatial[((dy + RADIUS) as usize) * side + (dx + RADIUS) as usize] =
                (-d2 / (2.0 * SIGMA_SPATIAL * SIGMA_SPATIAL)).exp();
        }
    }
    let range_denominator = 2.0 * SIGMA_RANGE * SIGMA_RANGE;

    let mut output = vec![0.0f32; src.len()];
    let mut acc = [0.0f32; 3];

    for y in 0..h {
        for x in 0..w {
            let centre_idx = (y * w + x) as usize * channels;
            let centre = &src[centre_idx..centre_idx + channels];
            acc[..channels].fill(0.0);
            let mut weight_sum = 0.0f32;

            for dy in -RADIUS..=RADIUS {
                let sy = y + dy;
                if sy < 0 || sy >= h {
                    continue;
                }
                for dx in -RADIUS..=RADIUS {
                    let sx = x + dx;
                    if sx < 0 || sx >= w {
                        continue;
                    }
                    let idx = (sy * w + sx) as usize * channels;
                    let neighbour = &src[idx..idx + channels];

                    let dist2: f32 = centre
                        .iter()
                        .zip(neighbour)
                        .map(|(&a, &b)| {
                            let d = a as f32 - b as f32;
                            d * d
                        })
                        .sum::<f32>()
                        / channels as f32;
                    let weight = spatial
                        [((dy + RADIUS) as usize) * side + (dx + RADIUS) as usize]
                        * (-dist2 / range_denominator).exp();

                    for (a, &v) in acc.iter_mut().zip(neighbour) {
                        *a += weight * v as f32;
                    }
                    weight_sum += weight;
                }
            }

            // The centre always contributes with weight 1, so the sum is positive.
            for c in 0..channels {
                output[centre_idx + c] = acc[c] / weight_sum;
            }
        }
    }

    output
}
