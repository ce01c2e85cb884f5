use std::{
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::{
    codec::raster::fit_on_canvas,
    export::{
        artifact::{ArtifactFile, ExportArtifact, ExportFormat},
        strategy::{ExportJob, ExportStrategy, StrategyContext},
    },
    foundation::{
        core::Canvas,
        error::{FlipbookError, FlipbookResult},
    },
};

/// Video container produced by [`VideoStrategy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VideoContainer {
    /// WebM with VP8.
    WebM,
    /// MP4 with H.264.
    Mp4,
}

impl VideoContainer {
    /// Matching export format.
    pub fn format(self) -> ExportFormat {
        match self {
            Self::WebM => ExportFormat::WebM,
            Self::Mp4 => ExportFormat::Mp4,
        }
    }

    /// ffmpeg encoder this container needs.
    pub fn codec(self) -> &'static str {
        match self {
            Self::WebM => "libvpx",
            Self::Mp4 => "libx264",
        }
    }

    fn output_args(self) -> &'static [&'static str] {
        match self {
            Self::WebM => &["-c:v", "libvpx", "-b:v", "2M", "-pix_fmt", "yuv420p", "-f", "webm"],
            Self::Mp4 => &[
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
                "-f",
                "mp4",
            ],
        }
    }
}

/// How frame timing is produced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VideoPacing {
    /// Timing comes from the container frame rate; frames are written as fast as possible.
    #[default]
    Offline,
    /// Each frame is held for `1/fps` of wall-clock time, like a live stream recorder.
    RealTime,
}

/// `true` when `program -version` runs successfully.
pub fn is_ffmpeg_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn has_encoder(program: &Path, codec: &str) -> bool {
    Command::new(program)
        .args(["-hide_banner", "-encoders"])
        .stderr(Stdio::null())
        .output()
        .map(|out| {
            out.status.success()
                && String::from_utf8_lossy(&out.stdout)
                    .split_whitespace()
                    .any(|w| w == codec)
        })
        .unwrap_or(false)
}

/// Video export through the system `ffmpeg` binary.
///
/// Frames are letterboxed onto an even-sized canvas and piped as raw RGBA on stdin.
#[derive(Clone, Debug)]
pub struct VideoStrategy {
    /// Target container.
    pub container: VideoContainer,
    /// ffmpeg executable name or path.
    pub program: PathBuf,
    /// Timing mode.
    pub pacing: VideoPacing,
    /// Letterbox color.
    pub background: [u8; 4],
}

impl VideoStrategy {
    /// Strategy for `container` using `ffmpeg` from `PATH`.
    pub fn new(container: VideoContainer) -> Self {
        Self {
            container,
            program: PathBuf::from("ffmpeg"),
            pacing: VideoPacing::Offline,
            background: [0, 0, 0, 255],
        }
    }

    /// Builder-style ffmpeg program.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Builder-style pacing.
    pub fn with_pacing(mut self, pacing: VideoPacing) -> Self {
        self.pacing = pacing;
        self
    }
}

struct TempOutput(PathBuf);

impl Drop for TempOutput {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl ExportStrategy for VideoStrategy {
    fn name(&self) -> &'static str {
        match self.container {
            VideoContainer::WebM => "webm",
            VideoContainer::Mp4 => "mp4",
        }
    }

    fn check_available(&self) -> FlipbookResult<()> {
        if !is_ffmpeg_available(&self.program) {
            return Err(FlipbookError::unavailable(format!(
                "'{}' is not runnable",
                self.program.display()
            )));
        }
        if !has_encoder(&self.program, self.container.codec()) {
            return Err(FlipbookError::unavailable(format!(
                "ffmpeg has no {} encoder",
                self.container.codec()
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(container = ?self.container, frames = job.frames.len()))]
    fn encode(&self, job: &ExportJob, ctx: &mut StrategyContext<'_>) -> FlipbookResult<ExportArtifact> {
        let first = job.frames.first().ok_or(FlipbookError::EmptySequence)?;
        let (width, height) = first.image().dimensions()?;
        let canvas = Canvas::new(width, height)?.even();
        let format = self.container.format();

        let out = TempOutput(std::env::temp_dir().join(format!(
            "flipbook-{}.{}",
            uuid::Uuid::new_v4(),
            format.extension()
        )));

        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args([
                "-y",
                "-loglevel",
                "error",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{}x{}", canvas.width, canvas.height),
                "-r",
                &job.fps.get().to_string(),
                "-i",
                "pipe:0",
                "-an",
            ])
            .args(self.container.output_args())
            .arg(&out.0);

        let mut child = cmd
            .spawn()
            .map_err(|e| FlipbookError::encoding(format!("failed to spawn ffmpeg: {e}")))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| FlipbookError::encoding("failed to open ffmpeg stdin"))?;

        // Drain stderr so a chatty ffmpeg never blocks on a full pipe.
        let stderr_thread = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let total = job.frames.len();
        let interval = job.fps.frame_interval();
        let mut write_result = Ok(());
        for (i, frame) in job.frames.iter().enumerate() {
            let img = match frame.image().decode() {
                Ok(img) => img,
                Err(e) => {
                    write_result = Err(e);
                    break;
                }
            };
            let rgba = fit_on_canvas(&img, canvas, self.background);
            if let Err(e) = stdin.write_all(rgba.as_raw()) {
                write_result = Err(FlipbookError::encoding(format!(
                    "failed to write frame {i} to ffmpeg: {e}"
                )));
                break;
            }
            if self.pacing == VideoPacing::RealTime {
                ctx.sleep(interval);
            }
            ctx.report(i + 1, total + 1);
        }
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| FlipbookError::encoding(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = stderr_thread
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        write_result?;
        if !status.success() {
            return Err(FlipbookError::encoding(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }

        let bytes = std::fs::read(&out.0)
            .map_err(|e| FlipbookError::encoding(format!("read ffmpeg output: {e}")))?;
        if bytes.is_empty() {
            return Err(FlipbookError::encoding("ffmpeg produced an empty file"));
        }
        ctx.report(total + 1, total + 1);

        let file = ArtifactFile {
            filename: job.artifact_name(format),
            mime: format.mime().to_string(),
            bytes,
        };
        Ok(ExportArtifact::single(format, self.name(), file))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/ffmpeg.rs"]
mod tests;
