use crate::{
    codec::normalize::{NormalizePreset, RawImage, normalize_with},
    foundation::error::{FlipbookError, FlipbookResult},
    store::{frame::Frame, frame_store::FrameStore},
};

/// Default opacity of the onion-skin overlay.
pub const DEFAULT_ONION_OPACITY: f32 = 0.5;

/// Onion-skin overlay settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OnionSkin {
    /// Whether the previous frame is shown behind the live view.
    pub enabled: bool,
    /// Overlay opacity in `[0, 1]`.
    pub opacity: f32,
}

impl Default for OnionSkin {
    fn default() -> Self {
        Self {
            enabled: true,
            opacity: DEFAULT_ONION_OPACITY,
        }
    }
}

impl OnionSkin {
    /// Reject opacities outside `[0, 1]`.
    pub fn validate(&self) -> FlipbookResult<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(FlipbookError::validation(format!(
                "onion-skin opacity must be in [0, 1], got {}",
                self.opacity
            )));
        }
        Ok(())
    }
}

/// State owned by one visit to the capture view.
///
/// Built when the view is entered and dropped when it is left; nothing outlives it.
#[derive(Clone, Debug)]
pub struct CaptureSession {
    preset: NormalizePreset,
    onion: OnionSkin,
    captured: usize,
}

impl CaptureSession {
    /// Session with the capture preset and default onion skin.
    pub fn new() -> Self {
        Self {
            preset: NormalizePreset::CAPTURE,
            onion: OnionSkin::default(),
            captured: 0,
        }
    }

    /// Session with explicit settings.
    pub fn with_settings(preset: NormalizePreset, onion: OnionSkin) -> FlipbookResult<Self> {
        preset.validate()?;
        onion.validate()?;
        tracing::debug!(?preset, ?onion, "capture session entered");
        Ok(Self {
            preset,
            onion,
            captured: 0,
        })
    }

    /// Normalization applied to captured stills.
    pub fn preset(&self) -> NormalizePreset {
        self.preset
    }

    /// Current onion-skin settings.
    pub fn onion_settings(&self) -> OnionSkin {
        self.onion
    }

    /// Show or hide the overlay.
    pub fn set_onion_enabled(&mut self, enabled: bool) {
        self.onion.enabled = enabled;
    }

    /// Change the overlay opacity; clamped to `[0, 1]`.
    pub fn set_onion_opacity(&mut self, opacity: f32) {
        self.onion.opacity = if opacity.is_nan() {
            DEFAULT_ONION_OPACITY
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    /// Frames added through this session.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Normalize a captured still and append it to `store`.
    #[tracing::instrument(skip_all)]
    pub fn capture(&mut self, store: &mut FrameStore, raw: impl Into<RawImage>) -> FlipbookResult<Frame> {
        let image = normalize_with(raw.into(), self.preset)?;
        let frame = store.add(image)?;
        self.captured += 1;
        Ok(frame)
    }

    /// The frame to overlay on the live view: the latest one, when the overlay is enabled.
    pub fn onion_skin<'s>(&self, store: &'s FrameStore) -> Option<&'s Frame> {
        if self.onion.enabled && self.onion.opacity > 0.0 {
            store.latest()
        } else {
            None
        }
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        tracing::debug!(captured = self.captured, "capture session left");
    }
}

#[cfg(test)]
#[path = "../tests/unit/session/session.rs"]
mod tests;
