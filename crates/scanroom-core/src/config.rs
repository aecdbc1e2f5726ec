//! Pipeline configuration.
//!
//! Settings that are a property of the rendering context rather than of the
//! page: preview and export renders of the same descriptor differ only in
//! their [`PipelineConfig`].

use serde::{Deserialize, Serialize};

use crate::transform::InterpolationFilter;

/// Default fill for pixels that fall outside the source after warping.
pub const DEFAULT_BACKGROUND: [u8; 3] = [255, 255, 255];

/// Default cap on either side of a warped output canvas.
pub const DEFAULT_MAX_OUTPUT_DIMENSION: u32 = 16_384;

/// Thresholding policy used by the black-and-white filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinarizeMethod {
    /// Global threshold: luminance below the value becomes black.
    Fixed(u8),
    /// Global threshold picked from the histogram with Otsu's method.
    Otsu,
    /// Local mean over a `(2 * block_radius + 1)` square window minus `c`.
    Adaptive { block_radius: u32, c: i32 },
}

impl Default for BinarizeMethod {
    fn default() -> Self {
        BinarizeMethod::Adaptive {
            block_radius: 15,
            c: 10,
        }
    }
}

/// Rendering settings shared by every run of a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// RGB fill for destination pixels that map outside the source.
    /// Gray outputs use its luminance.
    pub background: [u8; 3],

    /// Resampling filter for the homography warp.
    pub interpolation: InterpolationFilter,

    /// Thresholding used by the `BW` filter mode.
    pub binarize: BinarizeMethod,

    /// Largest width or height a warp may produce. Larger canvases are
    /// rejected with a dimension mismatch.
    pub max_output_dimension: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            interpolation: InterpolationFilter::Bilinear,
            binarize: BinarizeMethod::default(),
            max_output_dimension: DEFAULT_MAX_OUTPUT_DIMENSION,
        }
    }
}

impl PipelineConfig {
    /// Fast settings for interactive previews.
    pub fn preview() -> Self {
        Self::default()
    }

    /// High-quality settings for the final export.
    pub fn export() -> Self {
        Self {
            interpolation: InterpolationFilter::Lanczos3,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.background, [255, 255, 255]);
        assert_eq!(config.interpolation, InterpolationFilter::Bilinear);
        assert_eq!(
            config.binarize,
            BinarizeMethod::Adaptive {
                block_radius: 15,
                c: 10
            }
        );
    }

    #[test]
    fn test_presets_differ_only_in_interpolation() {
        let preview = PipelineConfig::preview();
        let export = PipelineConfig::export();
        assert_eq!(export.interpolation, InterpolationFilter::Lanczos3);
        assert_eq!(
            PipelineConfig {
                interpolation: InterpolationFilter::Bilinear,
                ..export
            },
            preview
        );
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"background": [0, 0, 0], "binarize": "Otsu"}"#).unwrap();
        assert_eq!(config.background, [0, 0, 0]);
        assert_eq!(config.binarize, BinarizeMethod::Otsu);
        assert_eq!(config.max_output_dimension, DEFAULT_MAX_OUTPUT_DIMENSION);
    }
}
