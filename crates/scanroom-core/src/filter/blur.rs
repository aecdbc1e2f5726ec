//! Gaussian blur on page buffers.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`], which only accepts
//! single-channel images: RGB buffers are split into three planes, each
//! plane is blurred independently and the result is interleaved again.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

use crate::buffer::ImageBuffer;
use crate::error::EditError;

/// Blur every channel of `image` with a Gaussian of the given sigma.
///
/// Non-positive sigma returns a copy of the image, since `imageproc`
/// panics on `sigma <= 0.0`.
pub(crate) fn gaussian_blur(image: &ImageBuffer, sigma: f32) -> Result<ImageBuffer, EditError> {
    if sigma <= 0.0 {
        return Ok(image.clone());
    }

    let (w, h) = image.dimensions();
    let planes: Vec<GrayImage> = (0..image.channels())
        .map(|c| {
            let plane = GrayImage::from_fn(w, h, |x, y| Luma([image.pixel(x, y)[c]]));
            gaussian_blur_f32(&plane, sigma)
        })
        .collect();

    let mut pixels = Vec::with_capacity(image.byte_size());
    for i in 0..image.pixel_count() {
        pixels.extend(planes.iter().map(|plane| plane.as_raw()[i]));
    }
    ImageBuffer::new(w, h, image.format(), pixels)
}
