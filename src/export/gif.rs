use image::{
    Delay,
    codecs::gif::{GifEncoder, Repeat},
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

/// Looping animated GIF encoded in-process.
#[derive(Clone, Copy, Debug)]
pub struct GifStrategy {
    /// Quantizer speed, `1` (best) to `30` (fastest).
    pub speed: i32,
    /// Letterbox color.
    pub background: [u8; 4],
    /// When `false` the strategy reports itself unavailable.
    pub enabled: bool,
}

impl Default for GifStrategy {
    fn default() -> Self {
        Self {
            speed: 10,
            background: [0, 0, 0, 255],
            enabled: true,
        }
    }
}

impl ExportStrategy for GifStrategy {
    fn name(&self) -> &'static str {
        "gif"
    }

    fn check_available(&self) -> FlipbookResult<()> {
        if !self.enabled {
            return Err(FlipbookError::unavailable("gif encoder disabled"));
        }
        if !(1..=30).contains(&self.speed) {
            return Err(FlipbookError::unavailable(format!(
                "gif speed {} outside 1..=30",
                self.speed
            )));
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(frames = job.frames.len(), fps = job.fps.get()))]
    fn encode(&self, job: &ExportJob, ctx: &mut StrategyContext<'_>) -> FlipbookResult<ExportArtifact> {
        let first = job.frames.first().ok_or(FlipbookError::EmptySequence)?;
        let (width, height) = first.image().dimensions()?;
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(FlipbookError::encoding(format!(
                "gif canvas {width}x{height} exceeds 65535"
            )));
        }
        let canvas = Canvas::new(width, height)?;
        let delay = Delay::from_numer_denom_ms(1000, job.fps.get());

        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut bytes, self.speed);
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| FlipbookError::encoding(format!("gif repeat: {e}")))?;

            let total = job.frames.len();
            for (i, frame) in job.frames.iter().enumerate() {
                let img = frame.image().decode()?;
                let buffer = fit_on_canvas(&img, canvas, self.background);
                encoder
                    .encode_frame(image::Frame::from_parts(buffer, 0, 0, delay))
                    .map_err(|e| FlipbookError::encoding(format!("gif frame {i}: {e}")))?;
                ctx.report(i + 1, total);
            }
        }

        let file = ArtifactFile {
            filename: job.artifact_name(ExportFormat::Gif),
            mime: ExportFormat::Gif.mime().to_string(),
            bytes,
        };
        Ok(ExportArtifact::single(ExportFormat::Gif, self.name(), file))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/gif.rs"]
mod tests;
