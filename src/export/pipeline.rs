use std::{path::PathBuf, time::Duration};

use crate::{
    export::{
        artifact::{ArtifactSink, ExportArtifact, ExportFormat},
        ffmpeg::{VideoContainer, VideoPacing, VideoStrategy},
        frames::FrameSequenceStrategy,
        gif::GifStrategy,
        progress::{ExportObserver, TriggerControl},
        strategy::{ExportJob, StrategyChain},
    },
    foundation::{
        core::{Fps, epoch_millis},
        error::{FlipbookError, FlipbookResult},
        time::{Pacer, ThreadPacer},
    },
    store::frame::Frame,
};

/// Label shown on the trigger while a job runs.
pub const BUSY_LABEL: &str = "Exporting...";

/// Tunables of the export strategies.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Prefix of single-file artifact names.
    pub app_name: String,
    /// ffmpeg executable name or path.
    pub ffmpeg_program: PathBuf,
    /// Pause between per-frame files, in milliseconds.
    pub frame_delay_ms: u64,
    /// Video timing mode.
    pub video_pacing: VideoPacing,
    /// GIF quantizer speed, `1..=30`.
    pub gif_speed: i32,
    /// Whether the GIF strategy is offered at all.
    pub gif_enabled: bool,
    /// Letterbox color for GIF and video.
    pub background: [u8; 4],
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            app_name: "flipbook".to_string(),
            ffmpeg_program: PathBuf::from("ffmpeg"),
            frame_delay_ms: 150,
            video_pacing: VideoPacing::Offline,
            gif_speed: 10,
            gif_enabled: true,
            background: [0, 0, 0, 255],
        }
    }
}

impl ExportSettings {
    /// Check user-provided values.
    pub fn validate(&self) -> FlipbookResult<()> {
        if self.app_name.trim().is_empty() {
            return Err(FlipbookError::validation("export.app_name must not be empty"));
        }
        if self
            .app_name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '\0'))
        {
            return Err(FlipbookError::validation(
                "export.app_name must be usable as a file name prefix",
            ));
        }
        if !(1..=30).contains(&self.gif_speed) {
            return Err(FlipbookError::validation("export.gif_speed must be in 1..=30"));
        }
        Ok(())
    }

    fn video(&self, container: VideoContainer) -> VideoStrategy {
        VideoStrategy {
            container,
            program: self.ffmpeg_program.clone(),
            pacing: self.video_pacing,
            background: self.background,
        }
    }

    fn frames(&self) -> FrameSequenceStrategy {
        FrameSequenceStrategy::new(Duration::from_millis(self.frame_delay_ms))
    }

    /// Fallback chain for `format`.
    pub fn chain_for(&self, format: ExportFormat) -> StrategyChain {
        let gif = GifStrategy {
            speed: self.gif_speed,
            background: self.background,
            enabled: self.gif_enabled,
        };
        match format {
            ExportFormat::Gif => StrategyChain::new().with(gif).with(self.frames()),
            ExportFormat::WebM => StrategyChain::new()
                .with(self.video(VideoContainer::WebM))
                .with(self.video(VideoContainer::Mp4))
                .with(self.frames()),
            ExportFormat::Mp4 => StrategyChain::new()
                .with(self.video(VideoContainer::Mp4))
                .with(self.video(VideoContainer::WebM))
                .with(self.frames()),
            ExportFormat::PngSequence => StrategyChain::new().with(self.frames()),
        }
    }
}

/// Runs export jobs one at a time and delivers their artifacts.
pub struct ExportPipeline {
    settings: ExportSettings,
    pacer: Box<dyn Pacer>,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    /// Pipeline that paces with real sleeps.
    pub fn new(settings: ExportSettings) -> Self {
        Self::with_pacer(settings, ThreadPacer)
    }

    /// Pipeline with an injected pacer.
    pub fn with_pacer(settings: ExportSettings, pacer: impl Pacer + 'static) -> Self {
        Self {
            settings,
            pacer: Box::new(pacer),
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Export `frames` as `format`, falling back along the format's chain.
    ///
    /// An empty sequence is rejected with [`FlipbookError::EmptySequence`] before any observer
    /// event.
    pub fn export(
        &mut self,
        frames: &[Frame],
        fps: Fps,
        format: ExportFormat,
        observer: &mut dyn ExportObserver,
    ) -> FlipbookResult<ExportArtifact> {
        let chain = self.settings.chain_for(format);
        self.export_with_chain(&chain, frames, fps, format, observer)
    }

    /// Export through an explicit chain.
    pub fn export_with_chain(
        &mut self,
        chain: &StrategyChain,
        frames: &[Frame],
        fps: Fps,
        format: ExportFormat,
        observer: &mut dyn ExportObserver,
    ) -> FlipbookResult<ExportArtifact> {
        if frames.is_empty() {
            return Err(FlipbookError::EmptySequence);
        }

        let job = ExportJob {
            frames: frames.to_vec(),
            fps,
            format,
            app_name: self.settings.app_name.clone(),
            started_at: epoch_millis(),
        };
        tracing::info!(format = %format, frames = frames.len(), chain = ?chain.names(), "export job");
        chain.run(&job, observer, self.pacer.as_mut())
    }

    /// [`ExportPipeline::export_with_chain`] with `control` disabled for the job's duration.
    ///
    /// The control's label and enabled flag are restored whatever the outcome.
    pub fn export_with_control(
        &mut self,
        control: &mut TriggerControl,
        chain: &StrategyChain,
        frames: &[Frame],
        fps: Fps,
        format: ExportFormat,
        observer: &mut dyn ExportObserver,
    ) -> FlipbookResult<ExportArtifact> {
        if frames.is_empty() {
            return Err(FlipbookError::EmptySequence);
        }
        let _guard = control.engage(BUSY_LABEL);
        self.export_with_chain(chain, frames, fps, format, observer)
    }

    /// Hand the artifact's files to `sink` with the artifact's inter-item delay.
    pub fn deliver(&mut self, artifact: &ExportArtifact, sink: &mut dyn ArtifactSink) -> FlipbookResult<()> {
        artifact.deliver(sink, self.pacer.as_mut())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
