use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Integer frames-per-second shared by playback and export.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct Fps(u32);

impl Fps {
    /// Default playback rate.
    pub const DEFAULT: Fps = Fps(12);
    /// Lowest rate offered by the playback controls.
    pub const MIN_UI: u32 = 1;
    /// Highest rate offered by the playback controls.
    pub const MAX_UI: u32 = 24;

    /// Create a validated FPS value (any positive integer).
    pub fn new(fps: u32) -> FlipbookResult<Self> {
        if fps == 0 {
            return Err(FlipbookError::validation("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    /// Clamp into the adjustable playback range `1..=24`.
    pub fn clamped_ui(fps: u32) -> Self {
        Self(fps.clamp(Self::MIN_UI, Self::MAX_UI))
    }

    /// Raw frames-per-second value.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Time between two frames (`1000/fps` milliseconds).
    pub fn frame_interval(self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.0))
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Fps {
    type Error = FlipbookError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Fps> for u32 {
    fn from(value: Fps) -> Self {
        value.0
    }
}

impl std::fmt::Display for Fps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} fps", self.0)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Placement of a source image inside a [`Canvas`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Scaled width.
    pub width: u32,
    /// Scaled height.
    pub height: u32,
    /// Left offset.
    pub x: u32,
    /// Top offset.
    pub y: u32,
}

impl Canvas {
    /// Create a validated, non-empty canvas.
    pub fn new(width: u32, height: u32) -> FlipbookResult<Self> {
        if width == 0 || height == 0 {
            return Err(FlipbookError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Round both sides down to even numbers (yuv420p requirement), keeping at least 2 px.
    pub fn even(self) -> Self {
        Self {
            width: (self.width & !1).max(2),
            height: (self.height & !1).max(2),
        }
    }

    /// Fit `src_w x src_h` inside the canvas preserving aspect ratio, centered (letterbox).
    pub fn place(self, src_w: u32, src_h: u32) -> Placement {
        if src_w == 0 || src_h == 0 {
            return Placement {
                width: 0,
                height: 0,
                x: self.width / 2,
                y: self.height / 2,
            };
        }

        let scale = f64::min(
            f64::from(self.width) / f64::from(src_w),
            f64::from(self.height) / f64::from(src_h),
        );
        let width = ((f64::from(src_w) * scale).round() as u32).clamp(1, self.width);
        let height = ((f64::from(src_h) * scale).round() as u32).clamp(1, self.height);

        Placement {
            width,
            height,
            x: (self.width - width) / 2,
            y: (self.height - height) / 2,
        }
    }
}

/// Milliseconds since the Unix epoch (0 if the system clock is before 1970).
pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
