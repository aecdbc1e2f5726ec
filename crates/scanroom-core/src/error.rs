//! Error types for the edit-operations pipeline.

use thiserror::Error;

/// Errors produced while validating a descriptor or running the pipeline.
///
/// Structural problems (wrong point count, disallowed rotation, singular
/// matrix) are hard errors. Out-of-range numeric parameters are clamped
/// during validation and never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The crop quadrilateral is malformed or degenerate.
    #[error("Invalid crop geometry: {0}")]
    InvalidGeometry(String),

    /// Coarse rotation is not one of 0, 90, 180 or 270 degrees.
    #[error("Invalid rotation: {0} degrees (expected 0, 90, 180 or 270)")]
    InvalidRotation(i32),

    /// The homography cannot be inverted or projects points to infinity.
    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),

    /// A buffer's size does not match its declared dimensions.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// The pixel layout is not one the pipeline can process.
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),

    /// The caller cancelled the run between two stages.
    #[error("Pipeline run was cancelled")]
    Cancelled,
}

impl EditError {
    pub(crate) fn dimension_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
        EditError::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
