use std::{
    collections::HashMap,
    io::Write as _,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use anyhow::Context as _;

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Durable key/value storage holding one serialized record per key.
///
/// `write` replaces the whole record or fails without touching the previous one.
pub trait StorageBackend {
    /// Read the record stored under `key`, if any.
    fn read(&self, key: &str) -> FlipbookResult<Option<String>>;
    /// Replace the record stored under `key`.
    fn write(&mut self, key: &str, value: &str) -> FlipbookResult<()>;
    /// Delete the record stored under `key` (no-op if absent).
    fn remove(&mut self, key: &str) -> FlipbookResult<()>;
}

/// Keys double as file stems: ASCII alphanumerics plus `.`, `_` and `-`.
pub fn validate_key(key: &str) -> FlipbookResult<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !ok {
        return Err(FlipbookError::validation(format!(
            "invalid storage key '{key}' (allowed: A-Z a-z 0-9 . _ -)"
        )));
    }
    Ok(())
}

fn check_quota(quota: Option<u64>, key: &str, len: usize) -> FlipbookResult<()> {
    if let Some(limit) = quota
        && len as u64 > limit
    {
        return Err(FlipbookError::quota(format!(
            "record '{key}' needs {len} bytes, quota is {limit}"
        )));
    }
    Ok(())
}

/// One JSON file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    /// Store records under `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    /// Reject records larger than `quota_bytes`.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write_atomic(&self, key: &str, value: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let tmp = self.tmp_path(key);
        let replace = || -> std::io::Result<()> {
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(value.as_bytes())?;
            f.sync_all()?;
            drop(f);
            std::fs::rename(&tmp, self.record_path(key))
        };
        // A partial temp file would keep holding the space a full disk needs back.
        replace().inspect_err(|_| {
            let _ = std::fs::remove_file(&tmp);
        })
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json.tmp"))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> FlipbookResult<Option<String>> {
        validate_key(key)?;
        let path = self.record_path(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read record '{}'", path.display()))
                .into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> FlipbookResult<()> {
        validate_key(key)?;
        check_quota(self.quota_bytes, key, value.len())?;

        self.write_atomic(key, value).map_err(|e| match e.kind() {
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::QuotaExceeded => {
                FlipbookError::quota(format!("write record '{key}': {e}"))
            }
            _ => FlipbookError::storage(format!("write record '{key}': {e}")),
        })
    }

    fn remove(&mut self, key: &str) -> FlipbookResult<()> {
        validate_key(key)?;
        let path = self.record_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FlipbookError::Other(
                anyhow::Error::new(e).context(format!("remove record '{}'", path.display())),
            )),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    quota_bytes: Option<u64>,
    writes: u64,
}

/// In-process storage. Clones share the same records, which lets tests simulate a reload by
/// opening a second store on a clone.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStorage {
    /// Empty storage without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the per-record byte quota for every clone.
    pub fn set_quota(&self, quota_bytes: Option<u64>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.quota_bytes = quota_bytes;
        }
    }

    /// Raw record under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.entries.get(key).cloned())
    }

    /// Overwrite a record directly, bypassing quota (used to plant corrupt data).
    pub fn put_raw(&self, key: &str, value: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.insert(key.to_string(), value.to_string());
        }
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.inner.lock().map(|inner| inner.writes).unwrap_or(0)
    }

    fn lock(&self) -> FlipbookResult<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| FlipbookError::storage("memory storage lock poisoned"))
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> FlipbookResult<Option<String>> {
        validate_key(key)?;
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> FlipbookResult<()> {
        validate_key(key)?;
        let mut inner = self.lock()?;
        check_quota(inner.quota_bytes, key, value.len())?;
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> FlipbookResult<()> {
        validate_key(key)?;
        self.lock()?.entries.remove(key);
        Ok(())
    }
}

/// Open file storage, creating the directory eagerly so configuration errors surface early.
pub fn open_file_storage(dir: &Path, quota_bytes: Option<u64>) -> FlipbookResult<FileStorage> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create storage directory '{}'", dir.display()))?;
    Ok(FileStorage::new(dir).with_quota(quota_bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/store/storage.rs"]
mod tests;
