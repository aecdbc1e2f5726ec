//! Raster image buffers passed between pipeline stages.
//!
//! An [`ImageBuffer`] is immutable once produced: its fields are private and
//! the only way to obtain one is through a constructor that checks the pixel
//! storage against the declared dimensions. Stages consume a buffer and
//! produce a new one, so no two stages ever alias the same pixels.

use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// Pixel layout of an [`ImageBuffer`], 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Single luminance channel.
    Gray8,
    /// Interleaved red, green, blue.
    Rgb8,
}

impl PixelFormat {
    /// Number of bytes per pixel.
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
        }
    }

    /// Map a channel count to a pixel format.
    ///
    /// Only 1 (gray) and 3 (RGB) channels are supported.
    pub fn from_channels(channels: u8) -> Result<Self, EditError> {
        match channels {
            1 => Ok(PixelFormat::Gray8),
            3 => Ok(PixelFormat::Rgb8),
            other => Err(EditError::UnsupportedPixelFormat(format!(
                "{other} channels per pixel"
            ))),
        }
    }
}

/// A row-major raster with a fixed pixel format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl ImageBuffer {
    /// Create a buffer, checking that `pixels.len() == width * height * channels`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::DimensionMismatch`] if either dimension is zero
    /// or the storage length is wrong.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Result<Self, EditError> {
        if width == 0 || height == 0 {
            return Err(EditError::dimension_mismatch(
                "non-zero width and height",
                format!("{width}x{height}"),
            ));
        }
        let expected = width as usize * height as usize * format.channels();
        if pixels.len() != expected {
            return Err(EditError::dimension_mismatch(
                format!("{expected} bytes"),
                format!("{} bytes", pixels.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Create a buffer from a raw channel count, as handed over by foreign callers.
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        pixels: Vec<u8>,
    ) -> Result<Self, EditError> {
        let format = PixelFormat::from_channels(channels)?;
        Self::new(width, height, format, pixels)
    }

    /// Create a buffer with every pixel set to `pixel`.
    ///
    /// `pixel` must hold exactly one value per channel.
    pub fn filled(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel: &[u8],
    ) -> Result<Self, EditError> {
        if pixel.len() != format.channels() {
            return Err(EditError::dimension_mismatch(
                format!("{} channel values", format.channels()),
                format!("{} channel values", pixel.len()),
            ));
        }
        let count = width as usize * height as usize;
        let pixels = pixel.repeat(count);
        Self::new(width, height, format, pixels)
    }

    /// Image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` tuple.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixel layout.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Raw row-major pixel storage.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the buffer and return its storage.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of the pixel storage in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Channel values of the pixel at `(x, y)`.
    ///
    /// Panics if the coordinate is out of bounds, like slice indexing.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels();
        let idx = (y as usize * self.width as usize + x as usize) * c;
        &self.pixels[idx..idx + c]
    }

    /// Wrap an `image::GrayImage` without copying.
    ///
    /// # Errors
    ///
    /// [`EditError::DimensionMismatch`] for an empty image.
    pub fn from_gray_image(img: GrayImage) -> Result<Self, EditError> {
        let (width, height) = img.dimensions();
        Self::new(width, height, PixelFormat::Gray8, img.into_raw())
    }

    /// Wrap an `image::RgbImage` without copying.
    ///
    /// # Errors
    ///
    /// [`EditError::DimensionMismatch`] for an empty image.
    pub fn from_rgb_image(img: RgbImage) -> Result<Self, EditError> {
        let (width, height) = img.dimensions();
        Self::new(width, height, PixelFormat::Rgb8, img.into_raw())
    }

    /// Copy a gray buffer into an `image::GrayImage`; `None` for RGB.
    pub(crate) fn to_gray_image(&self) -> Option<GrayImage> {
        match self.format {
            PixelFormat::Gray8 => GrayImage::from_raw(self.width, self.height, self.pixels.clone()),
            PixelFormat::Rgb8 => None,
        }
    }

    /// Copy an RGB buffer into an `image::RgbImage`; `None` for gray.
    pub(crate) fn to_rgb_image(&self) -> Option<RgbImage> {
        match self.format {
            PixelFormat::Rgb8 => RgbImage::from_raw(self.width, self.height, self.pixels.clone()),
            PixelFormat::Gray8 => None,
        }
    }

    /// Convert into the `image` crate's dynamic representation.
    pub fn into_dynamic_image(self) -> DynamicImage {
        // `from_raw` only fails on a length mismatch, which `new` rules out.
        match self.format {
            PixelFormat::Gray8 => GrayImage::from_raw(self.width, self.height, self.pixels)
                .map(DynamicImage::ImageLuma8)
                .unwrap_or_else(|| DynamicImage::new_luma8(self.width, self.height)),
            PixelFormat::Rgb8 => RgbImage::from_raw(self.width, self.height, self.pixels)
                .map(DynamicImage::ImageRgb8)
                .unwrap_or_else(|| DynamicImage::new_rgb8(self.width, self.height)),
        }
    }
}

impl TryFrom<DynamicImage> for ImageBuffer {
    type Error = EditError;

    /// Accepts 8-bit gray and RGB images; other layouts are rejected rather
    /// than silently converted.
    fn try_from(img: DynamicImage) -> Result<Self, Self::Error> {
        let color = img.color();
        match img {
            DynamicImage::ImageLuma8(gray) => Self::from_gray_image(gray),
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb_image(rgb),
            _ => Err(EditError::UnsupportedPixelFormat(format!("{color:?}"))),
        }
    }
}
