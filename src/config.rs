use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    codec::normalize::NormalizePreset,
    export::pipeline::ExportSettings,
    foundation::{
        core::Fps,
        error::{FlipbookError, FlipbookResult},
    },
    session::OnionSkin,
    store::{frame_store::FRAMES_STORAGE_KEY, storage::{FileStorage, open_file_storage, validate_key}},
};

/// Where and how the frame sequence is persisted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the record file.
    pub dir: PathBuf,
    /// Record key (file stem).
    pub key: String,
    /// Optional byte limit for one record.
    pub quota_bytes: Option<u64>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".flipbook"),
            key: FRAMES_STORAGE_KEY.to_string(),
            quota_bytes: None,
        }
    }
}

impl StorageSettings {
    /// Open the configured file backend.
    pub fn open(&self) -> FlipbookResult<FileStorage> {
        open_file_storage(&self.dir, self.quota_bytes)
    }
}

/// Initial playback session settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Frames per second, `1..=24`.
    pub fps: u32,
    /// Wrap to the first frame at the end.
    pub looping: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fps: Fps::DEFAULT.get(),
            looping: true,
        }
    }
}

/// Capture view settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Normalization of captured stills.
    pub preset: NormalizePreset,
    /// Onion-skin overlay.
    pub onion_skin: OnionSkin,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            preset: NormalizePreset::CAPTURE,
            onion_skin: OnionSkin::default(),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FlipbookConfig {
    /// Persistence.
    pub storage: StorageSettings,
    /// Playback defaults.
    pub playback: PlaybackSettings,
    /// Capture view.
    pub capture: CaptureSettings,
    /// Normalization of uploaded files.
    pub upload: NormalizePreset,
    /// Export strategies.
    pub export: ExportSettings,
}

impl Default for FlipbookConfig {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            playback: PlaybackSettings::default(),
            capture: CaptureSettings::default(),
            upload: NormalizePreset::UPLOAD,
            export: ExportSettings::default(),
        }
    }
}

impl FlipbookConfig {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> FlipbookResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| FlipbookError::serde(format!("parse config '{}': {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every section.
    pub fn validate(&self) -> FlipbookResult<()> {
        validate_key(&self.storage.key)?;
        if !(Fps::MIN_UI..=Fps::MAX_UI).contains(&self.playback.fps) {
            return Err(FlipbookError::validation(format!(
                "playback.fps must be in {}..={}, got {}",
                Fps::MIN_UI,
                Fps::MAX_UI,
                self.playback.fps
            )));
        }
        self.capture.preset.validate()?;
        self.capture.onion_skin.validate()?;
        self.upload.validate()?;
        self.export.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
