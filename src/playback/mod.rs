/// Playback state machine.
pub mod controller;
