/// Convenience result type used across Flipbook.
pub type FlipbookResult<T> = Result<T, FlipbookError>;

/// Top-level error taxonomy used by store, playback and export APIs.
#[derive(thiserror::Error, Debug)]
pub enum FlipbookError {
    /// Invalid user-provided parameters or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Source image could not be decoded; no frame was created.
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// Persistence write was rejected for lack of space. The mutation did not apply.
    #[error("storage quota exceeded: {0}")]
    StorageQuotaExceeded(String),

    /// Any other persistence failure. The mutation did not apply.
    #[error("storage error: {0}")]
    Storage(String),

    /// An export strategy's encoding capability is missing.
    #[error("encoding unavailable: {0}")]
    EncodingUnavailable(String),

    /// An export strategy failed while running.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// The operation needs at least one frame.
    #[error("frame sequence is empty")]
    EmptySequence,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlipbookError {
    /// Build a [`FlipbookError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlipbookError::ImageDecode`] value.
    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Build a [`FlipbookError::StorageQuotaExceeded`] value.
    pub fn quota(msg: impl Into<String>) -> Self {
        Self::StorageQuotaExceeded(msg.into())
    }

    /// Build a [`FlipbookError::Storage`] value.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Build a [`FlipbookError::EncodingUnavailable`] value.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::EncodingUnavailable(msg.into())
    }

    /// Build a [`FlipbookError::EncodingFailed`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingFailed(msg.into())
    }

    /// Build a [`FlipbookError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for failures that leave the last persisted state untouched.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageQuotaExceeded(_) | Self::Storage(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
