//! Coarse and fine rotation.
//!
//! - **Quarter turns** (90/180/270 degrees) are exact pixel permutations:
//!   no interpolation, so four 90-degree turns reproduce the input bit for bit.
//! - **Deskew** rotates by a small arbitrary angle around the image centre
//!   with bilinear interpolation. The output keeps the input dimensions:
//!   corners rotated out of frame are discarded and uncovered areas are
//!   filled with the background color.
//!
//! # Algorithm
//!
//! Deskew uses inverse mapping: for each pixel in the output image,
//! we calculate which source position contributes to it and interpolate.
//!
//! With y pointing down, a counter-clockwise turn by θ on screen has the
//! inverse transform:
//! ```text
//! src_x = (dst_x - cx) * cos(θ) - (dst_y - cy) * sin(θ) + cx
//! src_y = (dst_x - cx) * sin(θ) + (dst_y - cy) * cos(θ) + cy
//! ```

use tracing::debug;

use super::sample::{sample_into, InterpolationFilter};
use crate::buffer::ImageBuffer;
use crate::error::EditError;
use crate::luminance::fill_pixel;
use crate::ops::QuarterTurn;

/// Angles smaller than this (in degrees) are treated as no rotation.
const MIN_DESKEW_DEGREES: f64 = 0.001;

/// Rotate clockwise by a whole number of quarter turns.
///
/// Takes ownership so that [`QuarterTurn::None`] can hand the buffer back
/// without copying.
pub fn rotate_quarter(image: ImageBuffer, turn: QuarterTurn) -> Result<ImageBuffer, EditError> {
    if turn == QuarterTurn::None {
        return Ok(image);
    }

    let (src_w, src_h) = (image.width() as usize, image.height() as usize);
    let (dst_w, dst_h) = if turn.swaps_dimensions() {
        (src_h, src_w)
    } else {
        (src_w, src_h)
    };
    let channels = image.channels();
    let src = image.pixels();
    let mut output = vec![0u8; src.len()];

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            let (src_x, src_y) = match turn {
                QuarterTurn::Cw90 => (dst_y, src_h - 1 - dst_x),
                QuarterTurn::Cw180 => (src_w - 1 - dst_x, src_h - 1 - dst_y),
                QuarterTurn::Cw270 => (src_w - 1 - dst_y, dst_x),
                QuarterTurn::None => (dst_x, dst_y),
            };
            let src_idx = (src_y * src_w + src_x) * channels;
            let dst_idx = (dst_y * dst_w + dst_x) * channels;
            output[dst_idx..dst_idx + channels].copy_from_slice(&src[src_idx..src_idx + channels]);
        }
    }

    debug!(degrees = turn.degrees(), dst_w, dst_h, "Quarter-turn rotation applied");
    ImageBuffer::new(dst_w as u32, dst_h as u32, image.format(), output)
}

/// Rotate by a small angle around the image centre, keeping the dimensions.
///
/// # Arguments
///
/// * `image` - Source image
/// * `angle_degrees` - Rotation angle in degrees (positive = counter-clockwise)
/// * `background` - RGB fill for areas the rotated image no longer covers
pub fn apply_deskew(
    image: &ImageBuffer,
    angle_degrees: f64,
    background: [u8; 3],
) -> Result<ImageBuffer, EditError> {
    // Fast path: no rotation needed
    if angle_degrees.abs() < MIN_DESKEW_DEGREES {
        return Ok(image.clone());
    }

    let (w, h) = image.dimensions();
    let channels = image.channels();

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    // Rotation centre in index space.
    let cx = (w as f64 - 1.0) / 2.0;
    let cy = (h as f64 - 1.0) / 2.0;

    let fill = fill_pixel(image.format(), background);
    let mut output = vec![0u8; image.byte_size()];
    let mut pixel = [0u8; 3];

    for dst_y in 0..h {
        for dst_x in 0..w {
            let dx = dst_x as f64 - cx;
            let dy = dst_y as f64 - cy;

            // Inverse rotation into the source.
            let src_x = dx * cos - dy * sin + cx;
            let src_y = dx * sin + dy * cos + cy;

            let dst_idx = (dst_y as usize * w as usize + dst_x as usize) * channels;
            let slot = &mut output[dst_idx..dst_idx + channels];
            if sample_into(image, src_x, src_y, InterpolationFilter::Bilinear, &mut pixel) {
                slot.copy_from_slice(&pixel[..channels]);
            } else {
                slot.copy_from_slice(&fill[..channels]);
            }
        }
    }

    debug!(angle_degrees, w, h, "Deskew applied");
    ImageBuffer::new(w, h, image.format(), output)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::buffer::PixelFormat;
    use proptest::prelude::*;

    fn format_strategy() -> impl Strategy<Value = PixelFormat> {
        prop_oneof![Just(PixelFormat::Gray8), Just(PixelFormat::Rgb8)]
    }

    fn image_strategy() -> impl Strategy<Value = ImageBuffer> {
        (1u32..=24, 1u32..=24, format_strategy()).prop_flat_map(|(w, h, format)| {
            let len = (w * h) as usize * format.channels();
            prop::collection::vec(any::<u8>(), len)
                .prop_map(move |pixels| ImageBuffer::new(w, h, format, pixels).unwrap())
        })
    }

    fn turn_strategy() -> impl Strategy<Value = QuarterTurn> {
        prop_oneof![
            Just(QuarterTurn::None),
            Just(QuarterTurn::Cw90),
            Just(QuarterTurn::Cw180),
            Just(QuarterTurn::Cw270),
        ]
    }

    proptest! {
        #[test]
        fn prop_four_turns_restore_input(img in image_strategy(), turn in turn_strategy()) {
            let mut result = img.clone();
            for _ in 0..4 {
                result = rotate_quarter(result, turn).unwrap();
            }
            prop_assert_eq!(result, img);
        }

        #[test]
        fn prop_turn_is_a_permutation(img in image_strategy(), turn in turn_strategy()) {
            let mut before = img.pixels().to_vec();
            let rotated = rotate_quarter(img, turn).unwrap();
            let mut after = rotated.pixels().to_vec();
            // Holds per byte for gray and per pixel for RGB, so sorting bytes is enough.
            before.sort_unstable();
            after.sort_unstable();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_deskew_keeps_dimensions(
            img in image_strategy(),
            angle in -45.0f64..=45.0,
        ) {
            let result = apply_deskew(&img, angle, [255, 255, 255]).unwrap();
            prop_assert_eq!(result.dimensions(), img.dimensions());
            prop_assert_eq!(result.format(), img.format());
        }
    }
}
