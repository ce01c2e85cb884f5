/// Formats, artifact files and delivery sinks.
pub mod artifact;
/// Video through the system `ffmpeg`.
pub mod ffmpeg;
/// Per-frame PNG fallback.
pub mod frames;
/// Animated GIF.
pub mod gif;
/// Job entry point and chain selection.
pub mod pipeline;
/// Observer events and trigger control.
pub mod progress;
/// Strategy trait and fallback chain.
pub mod strategy;
