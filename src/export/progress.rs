use crate::{
    export::{artifact::ExportArtifact, strategy::ExportJob},
    foundation::error::FlipbookError,
};

/// Receives export job events. Every method defaults to a no-op.
pub trait ExportObserver {
    /// Job accepted; no strategy has run yet.
    fn on_started(&mut self, _job: &ExportJob) {}

    /// Strategy `name` is about to run.
    fn on_strategy(&mut self, _name: &str) {}

    /// Overall progress in `[0, 1]`, never decreasing within a job.
    fn on_progress(&mut self, _progress: f32) {}

    /// Strategy `name` was skipped or failed; the chain moves on.
    fn on_fallback(&mut self, _name: &str, _error: &FlipbookError) {}

    /// Job over, with the artifact or the last strategy's error.
    fn on_finished(&mut self, _outcome: Result<&ExportArtifact, &FlipbookError>) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ExportObserver for NoopObserver {}

/// Observer that logs events through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl ExportObserver for LogObserver {
    fn on_started(&mut self, job: &ExportJob) {
        tracing::info!(frames = job.frames.len(), fps = job.fps.get(), format = %job.format, "export started");
    }

    fn on_strategy(&mut self, name: &str) {
        tracing::debug!(strategy = name, "trying export strategy");
    }

    fn on_progress(&mut self, progress: f32) {
        tracing::trace!(progress, "export progress");
    }

    fn on_fallback(&mut self, name: &str, error: &FlipbookError) {
        tracing::warn!(strategy = name, error = %error, "export strategy fell through");
    }

    fn on_finished(&mut self, outcome: Result<&ExportArtifact, &FlipbookError>) {
        match outcome {
            Ok(a) => tracing::info!(strategy = a.strategy, files = a.files.len(), "export finished"),
            Err(e) => tracing::error!(error = %e, "export failed"),
        }
    }
}

/// The UI trigger of an export: a label and an enabled flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerControl {
    /// Visible label.
    pub label: String,
    /// Whether the trigger accepts input.
    pub enabled: bool,
}

impl TriggerControl {
    /// Enabled control labelled `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
        }
    }

    /// Disable the control and show `busy_label` until the guard drops.
    pub fn engage(&mut self, busy_label: &str) -> TriggerGuard<'_> {
        let saved = TriggerControl {
            label: std::mem::replace(&mut self.label, busy_label.to_string()),
            enabled: self.enabled,
        };
        self.enabled = false;
        TriggerGuard {
            control: self,
            saved,
        }
    }
}

/// Restores a [`TriggerControl`] on drop, whatever the job outcome.
#[derive(Debug)]
pub struct TriggerGuard<'a> {
    control: &'a mut TriggerControl,
    saved: TriggerControl,
}

impl TriggerGuard<'_> {
    /// Control state while engaged.
    pub fn control(&self) -> &TriggerControl {
        self.control
    }
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.control.label = std::mem::take(&mut self.saved.label);
        self.control.enabled = self.saved.enabled;
    }
}
