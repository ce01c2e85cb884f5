use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg: FlipbookConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, FlipbookConfig::default());
    assert_eq!(cfg.playback.fps, 12);
    assert!(cfg.playback.looping);
    assert_eq!(cfg.storage.key, "flipbook.frames");
    assert_eq!(cfg.capture.preset, NormalizePreset::CAPTURE);
    assert_eq!(cfg.upload, NormalizePreset::UPLOAD);
    assert_eq!(cfg.capture.onion_skin.opacity, 0.5);
    assert_eq!(cfg.export.app_name, "flipbook");
    assert_eq!(cfg.export.frame_delay_ms, 150);
    cfg.validate().unwrap();
}

#[test]
fn partial_sections_keep_other_defaults() {
    let cfg: FlipbookConfig = serde_json::from_str(
        r#"{"playback": {"fps": 6}, "export": {"video_pacing": "real-time"}}"#,
    )
    .unwrap();
    assert_eq!(cfg.playback.fps, 6);
    assert!(cfg.playback.looping);
    assert_eq!(
        cfg.export.video_pacing,
        crate::export::ffmpeg::VideoPacing::RealTime
    );
    assert_eq!(cfg.export.gif_speed, 10);
}

#[test]
fn validation_rejects_out_of_range_values() {
    let mut cfg = FlipbookConfig::default();
    cfg.playback.fps = 30;
    assert!(matches!(cfg.validate(), Err(FlipbookError::Validation(_))));

    let mut cfg = FlipbookConfig::default();
    cfg.upload.quality = 0.0;
    assert!(cfg.validate().is_err());

    let mut cfg = FlipbookConfig::default();
    cfg.storage.key = "../escape".into();
    assert!(cfg.validate().is_err());

    let mut cfg = FlipbookConfig::default();
    cfg.capture.onion_skin.opacity = -0.1;
    assert!(cfg.validate().is_err());
}

#[test]
fn load_reads_and_validates_file() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    std::fs::write(&good, r#"{"storage": {"dir": "frames", "quota_bytes": 1024}}"#).unwrap();
    let cfg = FlipbookConfig::load(&good).unwrap();
    assert_eq!(cfg.storage.dir, PathBuf::from("frames"));
    assert_eq!(cfg.storage.quota_bytes, Some(1024));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"playback": {"fps": 0}}"#).unwrap();
    assert!(FlipbookConfig::load(&bad).is_err());

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        FlipbookConfig::load(&broken),
        Err(FlipbookError::Serde(_))
    ));

    assert!(FlipbookConfig::load(&dir.path().join("missing.json")).is_err());
}

#[test]
fn storage_settings_open_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let settings = StorageSettings {
        dir: dir.path().join("nested/store"),
        ..StorageSettings::default()
    };
    let storage = settings.open().unwrap();
    assert!(storage.dir().is_dir());
}
