use super::area::StorageArea;
use super::bus::{ChangeBus, ContextId, StorageEvent, Subscription};
use crate::errors::StoreResult;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// One physical storage shared by any number of contexts.
pub struct StorageOrigin {
    area: Arc<dyn StorageArea>,
    bus: Arc<ChangeBus>,
}

impl StorageOrigin {
    pub fn new(area: Arc<dyn StorageArea>) -> Arc<Self> {
        Arc::new(Self {
            area,
            bus: ChangeBus::new(),
        })
    }

    /// Opens a new execution context on this origin.
    pub fn context(self: &Arc<Self>) -> KeyedStore {
        KeyedStore {
            origin: Arc::clone(self),
            context: ContextId::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.area.kind()
    }

    pub(crate) fn publish(&self, event: &StorageEvent) {
        self.bus.publish(event);
    }
}

/// Per-key JSON documents with change notification across contexts.
///
/// Writes are never reported back to the context that made them; a view in
/// the writing context must re-derive its state right after `save`.
/// Clones share the context they were cloned from.
#[derive(Clone)]
pub struct KeyedStore {
    origin: Arc<StorageOrigin>,
    context: ContextId,
}

impl KeyedStore {
    pub fn context_id(&self) -> ContextId {
        self.context
    }

    pub fn origin(&self) -> &Arc<StorageOrigin> {
        &self.origin
    }

    /// Another context on the same origin, as a second tab would be.
    pub fn sibling(&self) -> KeyedStore {
        self.origin.context()
    }

    /// Returns the document under `key`, or `fallback` when it is missing,
    /// unreadable or does not deserialize into `T`. Never writes.
    pub fn load<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        let raw = match self.origin.area.get_item(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return fallback,
            Err(e) => {
                warn!("load '{key}' failed, using fallback: {e}");
                return fallback;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("document '{key}' is malformed, using fallback: {e}");
                fallback
            }
        }
    }

    /// Replaces the document under `key` and notifies the other contexts.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value)?;
        let previous = self.origin.area.get_item(key).ok().flatten();

        self.origin.area.set_item(key, &raw)?;
        debug!("saved '{key}' ({} bytes) from {}", raw.len(), self.context);

        // Storage events only fire when the stored text actually changes.
        if previous.as_deref() != Some(raw.as_str()) {
            self.origin.publish(&StorageEvent {
                key: key.to_string(),
                new_value: Some(raw),
                source: self.context,
            });
        }
        Ok(())
    }

    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let existed = self.origin.area.get_item(key).ok().flatten().is_some();
        self.origin.area.remove_item(key)?;

        if existed {
            self.origin.publish(&StorageEvent {
                key: key.to_string(),
                new_value: None,
                source: self.context,
            });
        }
        Ok(())
    }

    pub fn keys(&self) -> StoreResult<Vec<String>> {
        self.origin.area.keys()
    }

    /// Runs `callback` for every change made by another context.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StorageEvent) + Send + Sync + 'static,
    {
        self.origin.bus.register(self.context, Arc::new(callback))
    }
}

impl std::fmt::Debug for KeyedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedStore")
            .field("backend", &self.origin.kind())
            .field("context", &self.context)
            .finish()
    }
}
