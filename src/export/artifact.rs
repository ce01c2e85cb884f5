use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::foundation::{error::FlipbookResult, time::Pacer};

/// Requested (or produced) export format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// Looping animated GIF.
    Gif,
    /// WebM (VP8) video.
    #[serde(rename = "webm")]
    WebM,
    /// MP4 (H.264) video.
    Mp4,
    /// One PNG per frame.
    PngSequence,
}

impl ExportFormat {
    /// File extension of the single-file artifact.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::WebM => "webm",
            Self::Mp4 => "mp4",
            Self::PngSequence => "png",
        }
    }

    /// MIME type of the produced container.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::WebM => "video/webm",
            Self::Mp4 => "video/mp4",
            Self::PngSequence => "image/png",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Gif => "gif",
            Self::WebM => "webm",
            Self::Mp4 => "mp4",
            Self::PngSequence => "png-sequence",
        })
    }
}

/// `<app>-<epoch-millis>.<ext>`
pub fn artifact_filename(app_name: &str, epoch_millis: i64, format: ExportFormat) -> String {
    format!("{app_name}-{epoch_millis}.{}", format.extension())
}

/// `frame-NNN.png` for the 1-based `number`.
pub fn frame_filename(number: usize) -> String {
    format!("frame-{number:03}.png")
}

/// One named downloadable blob.
#[derive(Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    /// Suggested file name.
    pub filename: String,
    /// MIME type of `bytes`.
    pub mime: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ArtifactFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactFile")
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Result of a successful export job.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    /// Format actually produced (may differ from the request after fallback).
    pub format: ExportFormat,
    /// Name of the strategy that produced it.
    pub strategy: &'static str,
    /// Files in delivery order.
    pub files: Vec<ArtifactFile>,
    /// Pause between two delivered files.
    pub item_delay: Duration,
}

impl ExportArtifact {
    /// Single-file artifact.
    pub fn single(format: ExportFormat, strategy: &'static str, file: ArtifactFile) -> Self {
        Self {
            format,
            strategy,
            files: vec![file],
            item_delay: Duration::ZERO,
        }
    }

    /// File names in delivery order.
    pub fn filenames(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.filename.as_str()).collect()
    }

    /// Hand every file to `sink`, pausing `item_delay` between items.
    pub fn deliver(&self, sink: &mut dyn ArtifactSink, pacer: &mut dyn Pacer) -> FlipbookResult<()> {
        for (i, file) in self.files.iter().enumerate() {
            if i > 0 {
                pacer.sleep(self.item_delay);
            }
            sink.deliver(file)?;
        }
        Ok(())
    }
}

/// Destination for exported files (the "download" step).
pub trait ArtifactSink {
    /// Accept one file.
    fn deliver(&mut self, file: &ArtifactFile) -> FlipbookResult<()>;
}

/// Writes each file into a directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Sink writing into `dir` (created on first delivery).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&mut self, file: &ArtifactFile) -> FlipbookResult<()> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create output directory '{}'", self.dir.display())
        })?;
        let path = self.dir.join(&file.filename);
        std::fs::write(&path, &file.bytes)
            .with_context(|| format!("write artifact '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = file.bytes.len(), "artifact written");
        self.written.push(path);
        Ok(())
    }
}

/// Collects delivered files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Files in delivery order.
    pub files: Vec<ArtifactFile>,
}

impl ArtifactSink for MemorySink {
    fn deliver(&mut self, file: &ArtifactFile) -> FlipbookResult<()> {
        self.files.push(file.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/artifact.rs"]
mod tests;
