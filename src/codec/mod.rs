/// Downscale and re-encode stills.
pub mod normalize;
/// Self-describing encoded image payload.
pub mod payload;
/// Pixel helpers shared by the encoders.
pub mod raster;
