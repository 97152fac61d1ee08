use super::area::StorageArea;
use crate::errors::{StoreError, StoreResult};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub const DOCUMENT_EXTENSION: &str = "json";

/// One `<key>.json` file per document inside `dir`.
#[derive(Debug)]
pub struct FileArea {
    dir: PathBuf,
    last_known: Mutex<HashMap<String, Option<String>>>,
}

impl FileArea {
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| StoreError::Io(format!("Failed to create {}: {e}", dir.display())))?;
        Ok(Self {
            dir,
            last_known: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn document_path(&self, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{DOCUMENT_EXTENSION}")))
    }

    /// Maps a path inside the area back to its key, if it is a document.
    pub fn key_for_path(&self, path: &Path) -> Option<String> {
        if path.parent()? != self.dir.as_path() {
            return None;
        }
        if path.extension()?.to_str()? != DOCUMENT_EXTENSION {
            return None;
        }
        let key = path.file_stem()?.to_str()?.to_string();
        validate_key(&key).ok()?;
        Some(key)
    }

    /// True when `current` matches the last content this process wrote or
    /// already reported for `key`.
    pub fn is_known_content(&self, key: &str, current: Option<&str>) -> bool {
        self.last_known
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|known| known.as_deref() == current)
    }

    /// Records `value` as known for `key`, returning what was known before.
    pub fn note_content(&self, key: &str, value: Option<&str>) -> Option<Option<String>> {
        self.last_known
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.map(str::to_string))
    }

    fn restore_known(&self, key: &str, previous: Option<Option<String>>) {
        let mut known = self.last_known.lock().unwrap_or_else(PoisonError::into_inner);
        match previous {
            Some(value) => known.insert(key.to_string(), value),
            None => known.remove(key),
        };
    }

    fn replace_document(&self, tmp: &Path, path: &Path, value: &str) -> StoreResult<()> {
        fs::write(tmp, value)
            .map_err(|e| StoreError::Io(format!("Failed to write {}: {e}", tmp.display())))?;
        fs::rename(tmp, path).map_err(|e| {
            let _ = fs::remove_file(tmp);
            StoreError::Io(format!("Failed to replace {}: {e}", path.display()))
        })
    }
}

impl StorageArea for FileArea {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.document_path(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(format!("Failed to read {}: {e}", path.display()))),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.document_path(key)?;
        let tmp = path.with_extension(format!("{DOCUMENT_EXTENSION}.tmp"));

        // Remember before the rename so a fast watcher never sees an unknown write.
        let previous = self.note_content(key, Some(value));
        if let Err(e) = self.replace_document(&tmp, &path, value) {
            self.restore_known(key, previous);
            return Err(e);
        }

        debug!("wrote {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let path = self.document_path(key)?;
        self.note_content(key, None);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(format!("Failed to remove {}: {e}", path.display()))),
        }
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let pattern = self.dir.join(format!("*.{DOCUMENT_EXTENSION}"));
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern)
            .map_err(|e| StoreError::Io(format!("Bad document pattern: {e}")))?;

        let mut keys: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|path| self.key_for_path(&path))
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn kind(&self) -> &'static str {
        "file"
    }
}

/// Keys become file names, so only a conservative character set is allowed.
pub fn validate_key(key: &str) -> StoreResult<()> {
    let valid_chars = key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if key.is_empty() || key.starts_with('.') || !valid_chars {
        return Err(StoreError::InvalidKey(format!("'{key}' is not a valid document key")));
    }
    Ok(())
}
