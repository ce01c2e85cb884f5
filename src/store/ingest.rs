use std::path::Path;

use crate::{
    codec::normalize::{NormalizePreset, RawImage, normalize_with},
    foundation::error::{FlipbookError, FlipbookResult},
    store::{frame::Frame, frame_store::FrameStore},
};

/// One source that did not become a frame.
#[derive(Debug)]
pub struct ImportFailure {
    /// Source label (file path or caller-provided name).
    pub source: String,
    /// Why it was rejected.
    pub error: FlipbookError,
}

/// Outcome of a batch import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Frames added, in input order.
    pub added: Vec<Frame>,
    /// Sources rejected individually (decode errors, unreadable files).
    pub failed: Vec<ImportFailure>,
    /// Sources not attempted after a storage failure.
    pub skipped: Vec<String>,
}

impl ImportReport {
    /// `true` when a persistence failure stopped the batch early.
    pub fn storage_failed(&self) -> bool {
        self.failed.iter().any(|f| f.error.is_storage())
    }
}

/// Normalize and add every source independently.
///
/// A source that fails to decode is recorded and the batch continues. A storage failure stops
/// the batch, since no later write can succeed either; the remaining sources are listed as
/// skipped.
#[tracing::instrument(skip(store, sources))]
pub fn import_images<I, S>(store: &mut FrameStore, sources: I, preset: NormalizePreset) -> ImportReport
where
    I: IntoIterator<Item = (S, FlipbookResult<RawImage>)>,
    S: Into<String>,
{
    let mut report = ImportReport::default();
    let mut sources = sources.into_iter();

    while let Some((label, raw)) = sources.next() {
        let label = label.into();
        let result = raw
            .and_then(|raw| normalize_with(raw, preset))
            .and_then(|image| store.add(image));

        match result {
            Ok(frame) => report.added.push(frame),
            Err(error) if error.is_storage() => {
                tracing::warn!(source = %label, error = %error, "storage failed, stopping import");
                report.failed.push(ImportFailure {
                    source: label,
                    error,
                });
                report.skipped = sources.by_ref().map(|(s, _)| s.into()).collect();
                break;
            }
            Err(error) => {
                tracing::warn!(source = %label, error = %error, "image skipped");
                report.failed.push(ImportFailure {
                    source: label,
                    error,
                });
            }
        }
    }

    tracing::info!(
        added = report.added.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "import finished"
    );
    report
}

/// Read image files from disk and import them in order.
pub fn import_files<P: AsRef<Path>>(
    store: &mut FrameStore,
    paths: &[P],
    preset: NormalizePreset,
) -> ImportReport {
    let sources = paths.iter().map(|p| {
        let p = p.as_ref();
        let raw = std::fs::read(p)
            .map(RawImage::Encoded)
            .map_err(|e| FlipbookError::image_decode(format!("read '{}': {e}", p.display())));
        (p.display().to_string(), raw)
    });
    import_images(store, sources, preset)
}

#[cfg(test)]
#[path = "../../tests/unit/store/ingest.rs"]
mod tests;
