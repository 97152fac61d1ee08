pub mod dashboard;
pub mod goals;
pub mod progress;
pub mod resources;
pub mod settings;
pub mod workspace;

use crate::store::KeyedStore;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Millisecond timestamp id, bumped past the largest existing id.
pub(crate) fn next_id(existing: impl Iterator<Item = i64>) -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    existing.max().map_or(now, |max| now.max(max.saturating_add(1)))
}

/// The stored list under `key`, record by record as raw JSON.
///
/// `seeds` only stand in while nothing is stored under `key`. A stored list is
/// returned untouched, including records that no longer fit the typed model,
/// so edits written back never drop them.
pub(crate) fn load_records<T: Serialize>(
    store: &KeyedStore,
    key: &str,
    seeds: impl FnOnce() -> Vec<T>,
) -> Vec<Value> {
    match store.load::<Option<Value>>(key, None) {
        Some(Value::Array(records)) => records,
        Some(other) => {
            warn!("document '{key}' is not a list, treating it as empty: {other}");
            Vec::new()
        }
        None => seeds()
            .iter()
            .filter_map(|seed| serde_json::to_value(seed).ok())
            .collect(),
    }
}

/// Typed view of `records`; records that do not decode are skipped.
pub(crate) fn decode_records<T: DeserializeOwned>(key: &str, records: &[Value]) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match T::deserialize(record) {
            Ok(item) => Some(item),
            Err(e) => {
                debug!("skipping record in '{key}': {e}");
                None
            }
        })
        .collect()
}

pub(crate) fn record_id(record: &Value) -> Option<i64> {
    record.get("id")?.as_i64()
}

pub(crate) fn to_record<T: Serialize>(item: &T) -> Result<Value, String> {
    serde_json::to_value(item).map_err(|e| format!("Serialize error: {e}"))
}

/// Overwrites the fields `update` carries and keeps every other field.
pub(crate) fn merge_record(record: &mut Value, update: Value) {
    match (record, update) {
        (Value::Object(fields), Value::Object(changes)) => fields.extend(changes),
        (slot, update) => *slot = update,
    }
}
