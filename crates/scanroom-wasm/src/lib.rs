//! Scanroom WASM - WebAssembly bindings for the edit pipeline
//!
//! Exposes scanroom-core to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible page image wrapper
//! - `pipeline` - Apply, validate and reset edit-operations descriptors
//!
//! # Usage
//!
//! ```typescript
//! import init, { apply_edit_ops, JsImageBuffer } from '@scanroom/wasm';
//!
//! await init();
//!
//! const page = new JsImageBuffer(width, height, 3, rgbBytes);
//! const edited = apply_edit_ops(page, { rotate: 90, filter: { mode: "GRAY" } }, false);
//! console.log(`Edited ${edited.width}x${edited.height}, ${edited.channels} channel(s)`);
//! ```

use wasm_bindgen::prelude::*;

mod pipeline;
mod types;

pub use pipeline::{apply_edit_ops, reset_edit_ops, validate_edit_ops};
pub use types::JsImageBuffer;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
