//! Scanroom Core - document edit-operations pipeline
//!
//! Turns a photographed or scanned page into a clean, rectified image by
//! applying an [`EditOps`] descriptor to an [`ImageBuffer`]:
//!
//! - **Geometric stage** ([`transform`]): perspective crop through a
//!   homography, then an exact quarter-turn rotation
//! - **Photometric stage** ([`filter`]): deskew, denoise and the filter
//!   stack (mode, contrast, brightness, sharpen)
//!
//! [`Pipeline`] validates the descriptor, runs both stages in order and
//! reports the first failure as an [`EditError`].
//!
//! The library emits `tracing` events but installs no subscriber.

pub mod buffer;
pub mod config;
pub mod error;
pub mod filter;
pub mod luminance;
pub mod ops;
pub mod pipeline;
pub mod transform;

pub use buffer::{ImageBuffer, PixelFormat};
pub use config::{BinarizeMethod, PipelineConfig};
pub use error::EditError;
pub use filter::apply_photometric;
pub use ops::{validate, EditOps, FilterMode, FilterParams, Point, QuarterTurn, ValidatedOps};
pub use pipeline::{CancelToken, Pipeline};
pub use transform::{apply_geometric, InterpolationFilter};
