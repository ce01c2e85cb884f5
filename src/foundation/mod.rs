/// Value types shared by every component.
pub mod core;
/// Error taxonomy.
pub mod error;
/// Clocks and pacers.
pub mod time;
