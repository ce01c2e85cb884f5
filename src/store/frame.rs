use crate::codec::payload::EncodedImage;

/// Opaque frame identifier, unique within a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    /// Fresh random identifier (UUID v4), unique even for frames created in the same millisecond.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FrameId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for FrameId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One still image of the animation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    id: FrameId,
    image: EncodedImage,
    /// Epoch milliseconds.
    created_at: i64,
}

impl Frame {
    pub(crate) fn new(id: FrameId, image: EncodedImage, created_at: i64) -> Self {
        Self {
            id,
            image,
            created_at,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &FrameId {
        &self.id
    }

    /// Encoded image payload.
    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// Creation time in epoch milliseconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }
}
