use std::io::Cursor;

use super::*;
use crate::store::storage::{MemoryStorage, StorageBackend};

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 10, 10, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn one_bad_file_does_not_abort_the_batch() {
    let mut store = FrameStore::open(MemoryStorage::new());
    let sources: Vec<(&str, FlipbookResult<RawImage>)> = vec![
        ("a.png", Ok(RawImage::Encoded(png(8, 8)))),
        ("broken.png", Ok(RawImage::Encoded(b"garbage".to_vec()))),
        ("c.png", Ok(RawImage::Encoded(png(4, 2)))),
    ];

    let report = import_images(&mut store, sources, NormalizePreset::UPLOAD);
    assert_eq!(report.added.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].source, "broken.png");
    assert!(matches!(report.failed[0].error, FlipbookError::ImageDecode(_)));
    assert!(report.skipped.is_empty());
    assert!(!report.storage_failed());
    assert_eq!(store.len(), 2);
}

#[test]
fn storage_exhaustion_stops_and_lists_skipped() {
    let mem = MemoryStorage::new();
    let mut store = FrameStore::open(mem.clone());
    mem.set_quota(Some(8));

    let sources: Vec<(&str, FlipbookResult<RawImage>)> = vec![
        ("a", Ok(RawImage::Encoded(png(2, 2)))),
        ("b", Ok(RawImage::Encoded(png(2, 2)))),
        ("c", Ok(RawImage::Encoded(png(2, 2)))),
    ];
    let report = import_images(&mut store, sources, NormalizePreset::CAPTURE);

    assert!(report.added.is_empty());
    assert!(report.storage_failed());
    assert_eq!(report.skipped, vec!["b".to_string(), "c".to_string()]);
    assert!(store.is_empty());
}

#[test]
fn import_files_reports_unreadable_paths() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.png");
    std::fs::write(&good, png(16, 16)).unwrap();
    let missing = dir.path().join("missing.png");

    let mut store = FrameStore::open(MemoryStorage::new());
    let report = import_files(&mut store, &[good, missing], NormalizePreset::UPLOAD);

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].source.ends_with("missing.png"));
}

struct FailsAfter {
    inner: MemoryStorage,
    writes_left: usize,
}

impl StorageBackend for FailsAfter {
    fn read(&self, key: &str) -> FlipbookResult<Option<String>> {
        self.inner.read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> FlipbookResult<()> {
        if self.writes_left == 0 {
            return Err(FlipbookError::storage("device went away"));
        }
        self.writes_left -= 1;
        self.inner.write(key, value)
    }

    fn remove(&mut self, key: &str) -> FlipbookResult<()> {
        self.inner.remove(key)
    }
}

#[test]
fn plain_storage_failure_also_stops_the_batch() {
    let mem = MemoryStorage::new();
    let mut store = FrameStore::open(FailsAfter {
        inner: mem.clone(),
        writes_left: 1,
    });

    let sources: Vec<(&str, FlipbookResult<RawImage>)> = vec![
        ("a", Ok(RawImage::Encoded(png(2, 2)))),
        ("b", Ok(RawImage::Encoded(png(2, 2)))),
        ("c", Ok(RawImage::Encoded(png(2, 2)))),
    ];
    let report = import_images(&mut store, sources, NormalizePreset::CAPTURE);

    assert_eq!(report.added.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(report.failed[0].error, FlipbookError::Storage(_)));
    assert_eq!(report.skipped, vec!["c".to_string()]);
    assert!(report.storage_failed());
    assert_eq!(store.len(), 1);
    assert_eq!(mem.write_count(), 1);
}
