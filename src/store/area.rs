use crate::errors::{StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Synchronous string storage shaped like a browser storage area.
///
/// Implementations only move raw document text; JSON handling lives in
/// `KeyedStore`.
pub trait StorageArea: Send + Sync {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove_item(&self, key: &str) -> StoreResult<()>;
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Short backend name used in logs and workspace metadata.
    fn kind(&self) -> &'static str;
}

/// Process-local area, used for tests and the `memory` backend.
#[derive(Debug, Default)]
pub struct MemoryArea {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total size of keys plus values, in bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }
}

impl StorageArea for MemoryArea {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory area"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory area"))?;

        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.items
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory area"))?
            .remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let items = self
            .items
            .lock()
            .map_err(|_| StoreError::LockPoisoned("memory area"))?;
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}
