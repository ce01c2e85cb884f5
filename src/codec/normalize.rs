use std::io::Cursor;

use image::{DynamicImage, codecs::jpeg::JpegEncoder, imageops::FilterType};

use crate::{
    codec::{payload::EncodedImage, raster::flatten_to_rgb},
    foundation::error::{FlipbookError, FlipbookResult},
};

/// Background used when dropping alpha for the lossy encoding.
const JPEG_MATTE: [u8; 4] = [0, 0, 0, 255];

/// Raw input to [`normalize`]: a decoded snapshot or an encoded file buffer.
#[derive(Clone, Debug)]
pub enum RawImage {
    /// Encoded image bytes (uploaded file, camera JPEG, ...).
    Encoded(Vec<u8>),
    /// Already decoded pixels.
    Bitmap(DynamicImage),
}

impl From<Vec<u8>> for RawImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Encoded(bytes)
    }
}

impl From<DynamicImage> for RawImage {
    fn from(img: DynamicImage) -> Self {
        Self::Bitmap(img)
    }
}

impl RawImage {
    fn into_pixels(self) -> FlipbookResult<DynamicImage> {
        match self {
            Self::Bitmap(img) => Ok(img),
            Self::Encoded(bytes) => image::load_from_memory(&bytes)
                .map_err(|e| FlipbookError::image_decode(format!("decode source image: {e}"))),
        }
    }
}

/// Target size/quality pair for [`normalize`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NormalizePreset {
    /// Longest side after downscaling, in pixels.
    pub max_dimension: u32,
    /// Lossy quality in `(0, 1]`.
    pub quality: f32,
}

impl NormalizePreset {
    /// Live capture: small payloads to bound storage growth.
    pub const CAPTURE: NormalizePreset = NormalizePreset {
        max_dimension: 800,
        quality: 0.55,
    };

    /// Bulk upload: higher fidelity, fewer items.
    pub const UPLOAD: NormalizePreset = NormalizePreset {
        max_dimension: 1280,
        quality: 0.7,
    };

    /// Check `max_dimension > 0` and `quality` in `(0, 1]`.
    pub fn validate(&self) -> FlipbookResult<()> {
        if self.max_dimension == 0 {
            return Err(FlipbookError::validation("max_dimension must be > 0"));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(FlipbookError::validation(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// JPEG quality on the encoder's 1..=100 scale.
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Dimensions after scaling `width x height` down (never up) to fit `max_dimension`.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension || longest == 0 {
        return (width, height);
    }

    let scale = f64::from(max_dimension) / f64::from(longest);
    let w = ((f64::from(width) * scale).round() as u32).clamp(1, max_dimension);
    let h = ((f64::from(height) * scale).round() as u32).clamp(1, max_dimension);
    (w, h)
}

/// Normalize with a preset.
pub fn normalize_with(raw: RawImage, preset: NormalizePreset) -> FlipbookResult<EncodedImage> {
    normalize(raw, preset.max_dimension, preset.quality)
}

/// Downscale and re-encode an image into a compact, storable payload.
///
/// The lossy JPEG candidate is kept unless a plain PNG of the same pixels is smaller.
#[tracing::instrument(skip(raw))]
pub fn normalize(raw: RawImage, max_dimension: u32, quality: f32) -> FlipbookResult<EncodedImage> {
    let preset = NormalizePreset {
        max_dimension,
        quality,
    };
    preset.validate()?;

    let src = raw.into_pixels()?;
    let (w, h) = scaled_dimensions(src.width(), src.height(), max_dimension);
    let img = if (w, h) == (src.width(), src.height()) {
        src
    } else {
        src.resize_exact(w, h, FilterType::Triangle)
    };

    let rgba = img.to_rgba8();
    let rgb = flatten_to_rgb(&rgba, JPEG_MATTE);

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(JpegEncoder::new_with_quality(
            &mut jpeg,
            preset.jpeg_quality(),
        ))
        .map_err(|e| FlipbookError::encoding(format!("jpeg encode: {e}")))?;

    let mut png = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| FlipbookError::encoding(format!("png encode: {e}")))?;

    tracing::debug!(
        width = w,
        height = h,
        jpeg_len = jpeg.len(),
        png_len = png.len(),
        "normalized image"
    );

    if jpeg.len() > png.len() {
        Ok(EncodedImage::new("image/png", png))
    } else {
        Ok(EncodedImage::new("image/jpeg", jpeg))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/normalize.rs"]
mod tests;
