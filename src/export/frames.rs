use std::{io::Cursor, time::Duration};

use crate::{
    export::{
        artifact::{ArtifactFile, ExportArtifact, ExportFormat, frame_filename},
        strategy::{ExportJob, ExportStrategy, StrategyContext},
    },
    foundation::error::{FlipbookError, FlipbookResult},
    store::frame::Frame,
};

/// Last-resort export: one PNG file per frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameSequenceStrategy {
    /// Pause between two delivered files.
    pub item_delay: Duration,
}

impl Default for FrameSequenceStrategy {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(150),
        }
    }
}

impl FrameSequenceStrategy {
    /// Strategy pausing `item_delay` between delivered files.
    pub fn new(item_delay: Duration) -> Self {
        Self { item_delay }
    }
}

fn to_png(frame: &Frame) -> FlipbookResult<Vec<u8>> {
    if frame.image().mime() == "image/png" {
        return Ok(frame.image().bytes().to_vec());
    }
    let img = frame.image().decode()?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| FlipbookError::encoding(format!("png encode: {e}")))?;
    Ok(out.into_inner())
}

impl ExportStrategy for FrameSequenceStrategy {
    fn name(&self) -> &'static str {
        "frames"
    }

    fn check_available(&self) -> FlipbookResult<()> {
        Ok(())
    }

    fn encode(&self, job: &ExportJob, ctx: &mut StrategyContext<'_>) -> FlipbookResult<ExportArtifact> {
        if job.frames.is_empty() {
            return Err(FlipbookError::EmptySequence);
        }

        let total = job.frames.len();
        let mut files = Vec::with_capacity(total);
        for (i, frame) in job.frames.iter().enumerate() {
            let (mime, bytes) = match to_png(frame) {
                Ok(bytes) => (ExportFormat::PngSequence.mime().to_string(), bytes),
                Err(e) => {
                    tracing::warn!(id = %frame.id(), error = %e, "frame kept as original payload");
                    (frame.image().mime().to_string(), frame.image().bytes().to_vec())
                }
            };
            files.push(ArtifactFile {
                filename: frame_filename(i + 1),
                mime,
                bytes,
            });
            ctx.report(i + 1, total);
        }

        Ok(ExportArtifact {
            format: ExportFormat::PngSequence,
            strategy: self.name(),
            files,
            item_delay: self.item_delay,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/frames.rs"]
mod tests;
