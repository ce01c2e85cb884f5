use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::foundation::error::{FlipbookError, FlipbookResult};

const OCTET_STREAM: &str = "application/octet-stream";

/// Self-describing encoded still image: MIME type plus encoded bytes.
///
/// Serialized as a `data:<mime>;base64,<payload>` URL so a persisted record carries no
/// external references.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime: String,
    bytes: Arc<Vec<u8>>,
}

impl EncodedImage {
    /// Wrap already-encoded bytes with an explicit MIME type.
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Wrap encoded bytes, sniffing the MIME type from the content.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mime = image::guess_format(&bytes)
            .map(mime_for_format)
            .unwrap_or(OCTET_STREAM);
        Self::new(mime, bytes)
    }

    /// MIME type, e.g. `image/jpeg`.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` when the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension matching the MIME type (without the dot).
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/bmp" => "bmp",
            _ => "bin",
        }
    }

    /// Decode back into pixels.
    pub fn decode(&self) -> FlipbookResult<image::DynamicImage> {
        image::load_from_memory(&self.bytes)
            .map_err(|e| FlipbookError::image_decode(format!("decode {} payload: {e}", self.mime)))
    }

    /// Pixel dimensions without a full decode.
    pub fn dimensions(&self) -> FlipbookResult<(u32, u32)> {
        image::ImageReader::new(std::io::Cursor::new(self.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| FlipbookError::image_decode(format!("sniff image format: {e}")))?
            .into_dimensions()
            .map_err(|e| FlipbookError::image_decode(format!("read image header: {e}")))
    }

    /// Render as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(self.bytes.as_slice()))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> FlipbookResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| FlipbookError::serde("image payload is not a data URL"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| FlipbookError::serde("data URL has no payload separator"))?;
        let mime = meta
            .strip_suffix(";base64")
            .ok_or_else(|| FlipbookError::serde("data URL payload is not base64"))?;
        let bytes = BASE64
            .decode(payload)
            .map_err(|e| FlipbookError::serde(format!("invalid base64 payload: {e}")))?;

        let mime = if mime.is_empty() { OCTET_STREAM } else { mime };
        Ok(Self::new(mime, bytes))
    }
}

impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl serde::Serialize for EncodedImage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> serde::Deserialize<'de> for EncodedImage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Self::from_data_url(&url).map_err(serde::de::Error::custom)
    }
}

/// MIME type for an `image` crate format.
pub fn mime_for_format(format: image::ImageFormat) -> &'static str {
    match format {
        image::ImageFormat::Jpeg => "image/jpeg",
        image::ImageFormat::Png => "image/png",
        image::ImageFormat::Gif => "image/gif",
        image::ImageFormat::WebP => "image/webp",
        image::ImageFormat::Bmp => "image/bmp",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/payload.rs"]
mod tests;
