//! WASM-compatible wrapper types for page images.
//!
//! JavaScript sees a plain width/height/channels/pixels object; the core
//! [`ImageBuffer`] stays on the Rust side.

use scanroom_core::{EditError, ImageBuffer};
use wasm_bindgen::prelude::*;

/// A page image for JavaScript.
///
/// # Memory Management
///
/// Pixel data lives in WASM memory. `pixels()` copies it into a JavaScript
/// `Uint8Array`, so keep images on the WASM side between edits and only
/// read pixels back when drawing.
#[wasm_bindgen]
pub struct JsImageBuffer {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsImageBuffer {
    /// Create an image from dimensions and interleaved pixel data.
    ///
    /// # Arguments
    /// * `width` - Image width in pixels
    /// * `height` - Image height in pixels
    /// * `channels` - 1 for gray, 3 for RGB
    /// * `pixels` - Row-major pixel data, `width * height * channels` bytes
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> JsImageBuffer {
        JsImageBuffer {
            width,
            height,
            channels,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel: 1 for gray, 3 for RGB.
    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Returns the pixel data as a Uint8Array (copied).
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl JsImageBuffer {
    /// Check the declared layout and convert into a core buffer.
    ///
    /// Clones the pixel data.
    pub(crate) fn to_core(&self) -> Result<ImageBuffer, EditError> {
        ImageBuffer::from_raw(self.width, self.height, self.channels, self.pixels.clone())
    }

    pub(crate) fn from_core(img: ImageBuffer) -> Self {
        let (width, height) = img.dimensions();
        let channels = img.channels() as u8;
        Self {
            width,
            height,
            channels,
            pixels: img.into_pixels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanroom_core::PixelFormat;

    #[test]
    fn test_creation() {
        let img = JsImageBuffer::new(100, 50, 3, vec![0u8; 100 * 50 * 3]);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert_eq!(img.channels(), 3);
        assert_eq!(img.byte_length(), 15000);
    }

    #[test]
    fn test_core_round_trip() {
        let js_img = JsImageBuffer::new(2, 1, 1, vec![7, 9]);
        let core = js_img.to_core().unwrap();
        assert_eq!(core.format(), PixelFormat::Gray8);

        let back = JsImageBuffer::from_core(core);
        assert_eq!(back.channels(), 1);
        assert_eq!(back.pixels(), vec![7, 9]);
    }

    #[test]
    fn test_bad_layout_rejected() {
        let wrong_len = JsImageBuffer::new(4, 4, 3, vec![0u8; 10]);
        assert!(matches!(
            wrong_len.to_core(),
            Err(EditError::DimensionMismatch { .. })
        ));

        let rgba = JsImageBuffer::new(1, 1, 4, vec![0u8; 4]);
        assert!(matches!(
            rgba.to_core(),
            Err(EditError::UnsupportedPixelFormat(_))
        ));
    }
}
