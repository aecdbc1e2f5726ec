//! Homography warp: fused crop and perspective correction.
//!
//! Resampling runs through an `imageproc` [`Projection`] in index space.
//! Bilinear output comes straight from [`warp_into`]. `imageproc` has no
//! Lanczos kernel, so the Lanczos3 path inverse-maps each output pixel
//! through the same projection and samples locally. Output pixels that map
//! outside the source get the configured background color.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::{debug, warn};

use super::sample::sample_into;
use crate::buffer::{ImageBuffer, PixelFormat};
use crate::config::PipelineConfig;
use crate::error::EditError;
use crate::luminance::fill_pixel;
use crate::ops::{Quad, WarpSpec};
use crate::transform::{Homography, InterpolationFilter};

/// Output canvas for an explicit warp: the bounding box of the projected
/// source corners, measured from the origin.
pub fn compute_warp_bounds(
    homography: &Homography,
    width: u32,
    height: u32,
) -> Result<(u32, u32), EditError> {
    let (w, h) = (width as f64, height as f64);
    let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];

    let reference = homography.w_component(0.0, 0.0).signum();
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for (x, y) in corners {
        if homography.w_component(x, y).signum() != reference {
            return Err(EditError::DegenerateTransform(
                "source corners project across the horizon".to_string(),
            ));
        }
        let (u, v) = homography.project(x, y).ok_or_else(|| {
            EditError::DegenerateTransform("source corner projects to infinity".to_string())
        })?;
        max_x = max_x.max(u);
        max_y = max_y.max(v);
    }

    if max_x < 1.0 || max_y < 1.0 {
        return Err(EditError::DegenerateTransform(format!(
            "warp maps the image outside the output canvas (extent {max_x:.1}x{max_y:.1})"
        )));
    }

    let clamp = |v: f64| v.ceil().min(u32::MAX as f64) as u32;
    Ok((clamp(max_x), clamp(max_y)))
}

/// Four-point projection from the crop corners onto the output rectangle.
fn quad_projection(quad: &Quad, (width, height): (u32, u32)) -> Option<Projection> {
    let from = (*quad.corners()).map(|p| (p.x as f32 - 0.5, p.y as f32 - 0.5));
    let (right, bottom) = (width as f32 - 0.5, height as f32 - 0.5);
    let to = [(-0.5, -0.5), (right, -0.5), (right, bottom), (-0.5, bottom)];
    Projection::from_control_points(from, to)
}

/// Index-space projection taking source pixels to output pixels.
///
/// A crop-derived warp is solved from its control points; an explicit warp
/// converts its matrix.
///
/// # Errors
///
/// [`EditError::DegenerateTransform`] if the transform is singular at
/// `f32` precision.
pub fn warp_projection(warp: &WarpSpec) -> Result<Projection, EditError> {
    let solved = match (warp.quad, warp.output_size) {
        (Some(quad), Some(size)) => quad_projection(&quad, size),
        _ => None,
    };
    // The f32 control-point solve can reject quads the f64 solve accepted.
    solved
        .or_else(|| warp.homography.to_projection())
        .ok_or_else(|| {
            EditError::DegenerateTransform("homography is singular at f32 precision".to_string())
        })
}

/// Bilinear warp via `imageproc`.
fn warp_bilinear(
    image: &ImageBuffer,
    projection: &Projection,
    background: [u8; 3],
    (width, height): (u32, u32),
) -> Result<ImageBuffer, EditError> {
    let unsupported = || EditError::UnsupportedPixelFormat(format!("{:?}", image.format()));
    match image.format() {
        PixelFormat::Gray8 => {
            let source = image.to_gray_image().ok_or_else(unsupported)?;
            let mut out = GrayImage::new(width, height);
            warp_into(
                &source,
                projection,
                Interpolation::Bilinear,
                Luma([background[0]]),
                &mut out,
            );
            ImageBuffer::from_gray_image(out)
        }
        PixelFormat::Rgb8 => {
            let source = image.to_rgb_image().ok_or_else(unsupported)?;
            let mut out = RgbImage::new(width, height);
            warp_into(
                &source,
                projection,
                Interpolation::Bilinear,
                Rgb(background),
                &mut out,
            );
            ImageBuffer::from_rgb_image(out)
        }
    }
}

/// Lanczos3 warp: inverse mapping through the projection, sampled locally.
fn warp_lanczos3(
    image: &ImageBuffer,
    projection: &Projection,
    background: [u8; 3],
    (width, height): (u32, u32),
) -> Result<ImageBuffer, EditError> {
    let inverse = projection.invert();
    let channels = image.channels();
    let mut output = vec![0u8; width as usize * height as usize * channels];
    let mut pixel = [0u8; 3];

    for dst_y in 0..height {
        for dst_x in 0..width {
            let dst_idx = (dst_y as usize * width as usize + dst_x as usize) * channels;
            let slot = &mut output[dst_idx..dst_idx + channels];

            let (sx, sy) = inverse * (dst_x as f32, dst_y as f32);
            let hit = sample_into(
                image,
                sx as f64,
                sy as f64,
                InterpolationFilter::Lanczos3,
                &mut pixel,
            );

            if hit {
                slot.copy_from_slice(&pixel[..channels]);
            } else {
                slot.copy_from_slice(&background[..channels]);
            }
        }
    }

    ImageBuffer::new(width, height, image.format(), output)
}

/// Resample `image` through the warp.
///
/// # Errors
///
/// - [`EditError::DegenerateTransform`] if the homography cannot be inverted
///   or the explicit-warp canvas cannot be determined
/// - [`EditError::DimensionMismatch`] if the output would exceed
///   `config.max_output_dimension` on either side
pub fn apply_warp(
    image: &ImageBuffer,
    warp: &WarpSpec,
    config: &PipelineConfig,
) -> Result<ImageBuffer, EditError> {
    let (dst_w, dst_h) = match warp.output_size {
        Some(size) => size,
        None => compute_warp_bounds(&warp.homography, image.width(), image.height())?,
    };

    let limit = config.max_output_dimension;
    if dst_w > limit || dst_h > limit {
        warn!(dst_w, dst_h, limit, "Warp output exceeds size limit");
        return Err(EditError::dimension_mismatch(
            format!("at most {limit}x{limit}"),
            format!("{dst_w}x{dst_h}"),
        ));
    }

    let projection = warp_projection(warp)?;
    let background = fill_pixel(image.format(), config.background);
    let output = match config.interpolation {
        InterpolationFilter::Bilinear => {
            warp_bilinear(image, &projection, background, (dst_w, dst_h))?
        }
        InterpolationFilter::Lanczos3 => {
            warp_lanczos3(image, &projection, background, (dst_w, dst_h))?
        }
    };

    debug!(
        src_w = image.width(),
        src_h = image.height(),
        dst_w,
        dst_h,
        filter = ?config.interpolation,
        "Homography warp applied"
    );

    Ok(output)
}
