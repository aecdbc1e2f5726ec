//! WASM bindings for the edit pipeline.
//!
//! Descriptors cross the boundary as plain JavaScript objects with the same
//! shape as the core `EditOps` (`crop`, `warp`, `rotate`, `filter`,
//! `denoise`, `deskew`); missing fields take their neutral values. Errors
//! come back as strings.

use scanroom_core::{validate, EditError, EditOps, Pipeline, PipelineConfig};
use wasm_bindgen::prelude::*;

use crate::types::JsImageBuffer;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_ops(ops: JsValue) -> Result<EditOps, JsValue> {
    serde_wasm_bindgen::from_value(ops)
        .map_err(|e| JsValue::from_str(&format!("Invalid edit operations: {}", e)))
}

fn run_edit_ops(
    image: &JsImageBuffer,
    ops: &EditOps,
    export: bool,
) -> Result<JsImageBuffer, EditError> {
    let config = if export {
        PipelineConfig::export()
    } else {
        PipelineConfig::preview()
    };
    let source = image.to_core()?;
    let output = Pipeline::new(config).run(source, ops)?;
    Ok(JsImageBuffer::from_core(output))
}

fn normalize_edit_ops(ops: &EditOps) -> Result<EditOps, EditError> {
    validate(ops).map(|validated| validated.to_edit_ops())
}

/// Apply an edit-operations descriptor to a page image.
///
/// # Arguments
///
/// * `image` - Source page (gray or RGB)
/// * `ops` - Descriptor object, e.g. `{ rotate: 90, filter: { mode: "GRAY" } }`
/// * `export` - Use high-quality Lanczos3 resampling (slower), otherwise bilinear
///
/// # Example (TypeScript)
///
/// ```typescript
/// const page = apply_edit_ops(source, {
///   crop: [{ x: 12, y: 8 }, { x: 590, y: 20 }, { x: 600, y: 810 }, { x: 5, y: 800 }],
///   filter: { mode: "BW" },
/// }, false);
/// ```
#[wasm_bindgen]
pub fn apply_edit_ops(
    image: &JsImageBuffer,
    ops: JsValue,
    export: bool,
) -> Result<JsImageBuffer, JsValue> {
    let ops = parse_ops(ops)?;
    run_edit_ops(image, &ops, export).map_err(to_js_error)
}

/// Validate a descriptor and return its normalized form.
///
/// Out-of-range values come back clamped and a crop comes back with its
/// derived `warp` filled in. Structural problems (bad crop, rotation that is
/// not a quarter turn, singular matrix) are returned as errors.
#[wasm_bindgen]
pub fn validate_edit_ops(ops: JsValue) -> Result<JsValue, JsValue> {
    let ops = parse_ops(ops)?;
    let normalized = normalize_edit_ops(&ops).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&normalized).map_err(to_js_error)
}

/// A neutral descriptor: applying it leaves an image unchanged.
#[wasm_bindgen]
pub fn reset_edit_ops() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&EditOps::default()).map_err(to_js_error)
}
