//! Edit pipeline orchestration.
//!
//! A [`Pipeline`] validates a descriptor and then runs the geometric stage
//! followed by the photometric stage. The first error aborts the run and no
//! partial output is returned. The source buffer is consumed, never
//! modified in place; a descriptor with nothing to do hands it back as-is.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::buffer::ImageBuffer;
use crate::config::PipelineConfig;
use crate::error::EditError;
use crate::filter::apply_photometric;
use crate::ops::{validate, EditOps, ValidatedOps};
use crate::transform::apply_geometric;

/// Cooperative cancellation flag, checked between stages.
///
/// Clones share the same flag, so one can be handed to another thread and
/// cancelled from there.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The running pipeline stops before its next stage.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), EditError> {
        if self.is_cancelled() {
            Err(EditError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs edit descriptors against page images.
///
/// Holds only configuration, so a single instance can serve concurrent
/// invocations from several threads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate `ops` and apply it to `source`.
    ///
    /// # Errors
    ///
    /// Validation errors are reported before any pixel work. Stage errors
    /// abort the run.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn run(&self, source: ImageBuffer, ops: &EditOps) -> Result<ImageBuffer, EditError> {
        let validated = validate(ops).inspect_err(|err| {
            warn!(error = %err, "Edit operations rejected");
        })?;
        self.run_validated(source, &validated)
    }

    /// Apply an already validated descriptor.
    pub fn run_validated(
        &self,
        source: ImageBuffer,
        ops: &ValidatedOps,
    ) -> Result<ImageBuffer, EditError> {
        self.run_with_cancel(source, ops, &CancelToken::new())
    }

    /// Apply a validated descriptor, stopping with [`EditError::Cancelled`]
    /// if `cancel` is set before a stage starts.
    #[instrument(skip_all, fields(width = source.width(), height = source.height()))]
    pub fn run_with_cancel(
        &self,
        source: ImageBuffer,
        ops: &ValidatedOps,
        cancel: &CancelToken,
    ) -> Result<ImageBuffer, EditError> {
        self.run_stages(source, ops, cancel, || {})
    }

    /// Stage sequence. `between_stages` runs after the geometric stage and
    /// before the cancellation check that guards the photometric stage.
    fn run_stages(
        &self,
        source: ImageBuffer,
        ops: &ValidatedOps,
        cancel: &CancelToken,
        between_stages: impl FnOnce(),
    ) -> Result<ImageBuffer, EditError> {
        cancel.check()?;

        if !ops.has_any_edit_ops() {
            debug!("No edit operations, returning source");
            return Ok(source);
        }

        let geometric = apply_geometric(source, ops, &self.config)?;
        debug!(
            width = geometric.width(),
            height = geometric.height(),
            "Geometric stage complete"
        );

        between_stages();
        cancel.check().inspect_err(|_| debug!("Cancelled after geometric stage"))?;

        let output = apply_photometric(geometric, ops, &self.config)?;
        debug!(
            width = output.width(),
            height = output.height(),
            format = ?output.format(),
            "Photometric stage complete"
        );

        info!(
            width = output.width(),
            height = output.height(),
            "Edit pipeline finished"
        );
        Ok(output)
    }
}
