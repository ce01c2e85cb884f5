use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::{
    export::{
        artifact::{ExportArtifact, ExportFormat, artifact_filename},
        progress::ExportObserver,
    },
    foundation::{
        core::Fps,
        error::{FlipbookError, FlipbookResult},
        time::Pacer,
    },
    store::frame::Frame,
};

/// Input of one export run.
#[derive(Clone, Debug)]
pub struct ExportJob {
    /// Source frames in sequence order. Never empty.
    pub frames: Vec<Frame>,
    /// Playback rate the artifact should reproduce.
    pub fps: Fps,
    /// Format the user asked for.
    pub format: ExportFormat,
    /// Prefix of single-file artifact names.
    pub app_name: String,
    /// Job start, epoch milliseconds.
    pub started_at: i64,
}

impl ExportJob {
    /// Single-file artifact name for `format`.
    pub fn artifact_name(&self, format: ExportFormat) -> String {
        artifact_filename(&self.app_name, self.started_at, format)
    }
}

/// Per-job services handed to a running strategy.
pub struct StrategyContext<'a> {
    observer: &'a mut dyn ExportObserver,
    pacer: &'a mut dyn Pacer,
    progress: f32,
}

impl<'a> StrategyContext<'a> {
    /// Context starting at zero progress.
    pub fn new(observer: &'a mut dyn ExportObserver, pacer: &'a mut dyn Pacer) -> Self {
        Self {
            observer,
            pacer,
            progress: 0.0,
        }
    }

    /// Report `done` of `total` units.
    ///
    /// Values below the high-water mark are dropped and the result is capped below 1.0, which is
    /// reserved for a finished job.
    pub fn report(&mut self, done: usize, total: usize) {
        if total == 0 {
            return;
        }
        let p = (done as f32 / total as f32).clamp(0.0, 0.99);
        if p > self.progress {
            self.progress = p;
            self.observer.on_progress(p);
        }
    }

    /// Highest progress reported so far.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Block for `d` (real-time pacing, delivery delays).
    pub fn sleep(&mut self, d: std::time::Duration) {
        self.pacer.sleep(d);
    }

    fn complete(&mut self) {
        self.progress = 1.0;
        self.observer.on_progress(1.0);
    }
}

/// One way of turning frames into an artifact.
pub trait ExportStrategy {
    /// Short name used in logs and in [`ExportArtifact::strategy`].
    fn name(&self) -> &'static str;

    /// `Err(EncodingUnavailable)` when the capability is missing on this host.
    fn check_available(&self) -> FlipbookResult<()>;

    /// Encode `job`, reporting progress through `ctx`.
    fn encode(&self, job: &ExportJob, ctx: &mut StrategyContext<'_>) -> FlipbookResult<ExportArtifact>;
}

/// Ordered fallback list of strategies.
///
/// Strategies run in order; the first success wins. An unavailable, failing or panicking strategy
/// passes the job to the next one. Only exhaustion surfaces, with the last error.
#[derive(Default)]
pub struct StrategyChain {
    strategies: Vec<Box<dyn ExportStrategy>>,
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl StrategyChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy (builder style).
    pub fn with(mut self, strategy: impl ExportStrategy + 'static) -> Self {
        self.push(strategy);
        self
    }

    /// Append a strategy.
    pub fn push(&mut self, strategy: impl ExportStrategy + 'static) {
        self.strategies.push(Box::new(strategy));
    }

    /// Strategy names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Number of strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// `true` when no strategy is configured.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run `job` through the chain.
    #[tracing::instrument(skip_all, fields(format = %job.format, frames = job.frames.len()))]
    pub fn run(
        &self,
        job: &ExportJob,
        observer: &mut dyn ExportObserver,
        pacer: &mut dyn Pacer,
    ) -> FlipbookResult<ExportArtifact> {
        observer.on_started(job);
        let mut ctx = StrategyContext::new(observer, pacer);
        let mut last_err = FlipbookError::unavailable("no export strategy configured");

        for strategy in &self.strategies {
            let name = strategy.name();
            ctx.observer.on_strategy(name);

            let result = strategy
                .check_available()
                .and_then(|()| run_guarded(strategy.as_ref(), job, &mut ctx));

            match result {
                Ok(artifact) => {
                    ctx.complete();
                    tracing::info!(strategy = name, files = artifact.files.len(), "export produced");
                    ctx.observer.on_finished(Ok(&artifact));
                    return Ok(artifact);
                }
                Err(e) => {
                    ctx.observer.on_fallback(name, &e);
                    last_err = e;
                }
            }
        }

        ctx.observer.on_finished(Err(&last_err));
        Err(last_err)
    }
}

fn run_guarded(
    strategy: &dyn ExportStrategy,
    job: &ExportJob,
    ctx: &mut StrategyContext<'_>,
) -> FlipbookResult<ExportArtifact> {
    match catch_unwind(AssertUnwindSafe(|| strategy.encode(job, ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(FlipbookError::encoding(format!(
                "strategy '{}' panicked: {msg}",
                strategy.name()
            )))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/strategy.rs"]
mod tests;
