//! Flipbook keeps an ordered, durably persisted sequence of still frames, plays it back as a
//! timed flipbook and exports it as an animated GIF, a WebM/MP4 video or a set of PNG files.
//!
//! - Normalize stills with [`normalize`] and keep them in a [`FrameStore`]
//! - Capture through a [`CaptureSession`] with an onion-skin reference
//! - Play a store snapshot with a [`PlaybackController`]
//! - Export through an [`ExportPipeline`] with a per-format fallback chain
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Image normalization and encoded payloads.
pub mod codec;
/// JSON configuration file.
pub mod config;
/// Export strategies, fallback chain and artifact delivery.
pub mod export;
/// Error taxonomy, core value types and time sources.
pub mod foundation;
/// Timed playback over a frame snapshot.
pub mod playback;
/// Capture-view session state.
pub mod session;
/// Frame sequence, persistence backends and batch ingest.
pub mod store;

pub use crate::codec::normalize::{NormalizePreset, RawImage, normalize, normalize_with};
pub use crate::codec::payload::EncodedImage;
pub use crate::config::FlipbookConfig;
pub use crate::export::artifact::{
    ArtifactFile, ArtifactSink, DirectorySink, ExportArtifact, ExportFormat, MemorySink,
};
pub use crate::export::pipeline::{ExportPipeline, ExportSettings};
pub use crate::export::progress::{ExportObserver, NoopObserver, TriggerControl};
pub use crate::export::strategy::{ExportJob, ExportStrategy, StrategyChain};
pub use crate::foundation::core::{Canvas, Fps};
pub use crate::foundation::error::{FlipbookError, FlipbookResult};
pub use crate::foundation::time::{Clock, ManualClock, Pacer, SystemClock, ThreadPacer};
pub use crate::playback::controller::{PlaybackController, PlaybackState, RenderSignal};
pub use crate::session::CaptureSession;
pub use crate::store::frame::{Frame, FrameId};
pub use crate::store::frame_store::FrameStore;
pub use crate::store::storage::{FileStorage, MemoryStorage, StorageBackend};
