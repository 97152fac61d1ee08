use crate::analysis::validation::validate_progress;
use crate::analysis::weekly::{self, same_week, week_start};
use crate::commands::settings::EffectiveSettings;
use crate::commands::{decode_records, load_records};
use crate::models::progress::{ProgressEntry, WeekSlot};
use crate::store::{KeyedStore, StorageEvent, Subscription};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const PROGRESS_KEY: &str = "progressEntries";

pub const PAST_DAY_LOCKED: &str = "You can't modify progress for past days this week.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressChange {
    pub kind: ChangeKind,
    pub entries: Vec<ProgressEntry>,
}

fn sample_entries() -> Vec<ProgressEntry> {
    [("2025-11-03", 50), ("2025-11-05", 80), ("2025-11-06", 60)]
        .into_iter()
        .filter_map(|(date, progress)| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|date| ProgressEntry::new(date, progress))
        })
        .collect()
}

fn entry_records(store: &KeyedStore, settings: &EffectiveSettings) -> Vec<Value> {
    load_records(store, PROGRESS_KEY, || {
        if settings.seed_defaults {
            sample_entries()
        } else {
            Vec::new()
        }
    })
}

/// Entries that decode, with the sample week standing in for a never-written key.
pub fn load_entries(store: &KeyedStore, settings: &EffectiveSettings) -> Vec<ProgressEntry> {
    decode_records(PROGRESS_KEY, &entry_records(store, settings))
}

/// Entries that decode, with no sample fallback.
pub fn recorded_entries(store: &KeyedStore) -> Vec<ProgressEntry> {
    let records = load_records(store, PROGRESS_KEY, Vec::<ProgressEntry>::new);
    decode_records(PROGRESS_KEY, &records)
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn has_date(record: &Value, day: &str) -> bool {
    record.get("date").and_then(Value::as_str) == Some(day)
}

/// True for days before `today` inside today's week; those are read-only.
pub fn is_day_locked(date: NaiveDate, today: NaiveDate) -> bool {
    same_week(date, today) && date < today
}

fn check_lock(settings: &EffectiveSettings, date: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if settings.lock_past_days && is_day_locked(date, today) {
        return Err(PAST_DAY_LOCKED.to_string());
    }
    Ok(())
}

/// Adds or edits the entry for `date`. Every stored entry with that date is
/// updated in place; otherwise a new entry is appended. Other records are
/// written back exactly as they were stored.
pub fn save_progress(
    store: &KeyedStore,
    settings: &EffectiveSettings,
    date: NaiveDate,
    progress: i64,
    today: NaiveDate,
) -> Result<ProgressChange, String> {
    let progress = validate_progress(progress).map_err(|e| e.to_string())?;
    check_lock(settings, date, today)?;

    let day = date_key(date);
    let mut records = entry_records(store, settings);
    let mut kind = ChangeKind::Added;
    for record in records.iter_mut().filter(|r| has_date(r, &day)) {
        if let Some(fields) = record.as_object_mut() {
            fields.insert("progress".to_string(), json!(progress));
        }
        kind = ChangeKind::Updated;
    }
    if kind == ChangeKind::Added {
        records.push(json!({ "date": day, "progress": progress }));
    }

    store
        .save(PROGRESS_KEY, &records)
        .map_err(|e| format!("Save error: {e}"))?;
    debug!("progress {date} = {progress} ({kind:?})");

    Ok(ProgressChange {
        kind,
        entries: decode_records(PROGRESS_KEY, &records),
    })
}

pub fn delete_progress(
    store: &KeyedStore,
    settings: &EffectiveSettings,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<ProgressChange, String> {
    check_lock(settings, date, today)?;

    let day = date_key(date);
    let mut records = entry_records(store, settings);
    records.retain(|r| !has_date(r, &day));

    store
        .save(PROGRESS_KEY, &records)
        .map_err(|e| format!("Save error: {e}"))?;

    Ok(ProgressChange {
        kind: ChangeKind::Deleted,
        entries: decode_records(PROGRESS_KEY, &records),
    })
}

pub fn weekly_progress(
    store: &KeyedStore,
    settings: &EffectiveSettings,
    reference: NaiveDate,
) -> Vec<WeekSlot> {
    weekly::compute(&load_entries(store, settings), reference)
}

/// "Week starting from" caption, e.g. `03 Nov 2025`.
pub fn week_label(reference: NaiveDate) -> String {
    week_start(reference)
        .unwrap_or(reference)
        .format("%d %b %Y")
        .to_string()
}

/// A weekly chart that re-derives itself whenever another context writes.
///
/// The writing context gets no notification for its own saves, so it calls
/// `refresh` after saving.
pub struct ProgressView {
    store: KeyedStore,
    settings: EffectiveSettings,
    state: Arc<Mutex<ViewState>>,
    _subscription: Subscription,
}

struct ViewState {
    reference: NaiveDate,
    slots: Vec<WeekSlot>,
}

impl ProgressView {
    pub fn open(store: KeyedStore, settings: EffectiveSettings, reference: NaiveDate) -> Self {
        let state = Arc::new(Mutex::new(ViewState {
            reference,
            slots: weekly_progress(&store, &settings, reference),
        }));

        let reader = store.clone();
        let watched = Arc::clone(&state);
        let view_settings = settings.clone();
        let subscription = store.subscribe(move |event: &StorageEvent| {
            if event.key != PROGRESS_KEY {
                return;
            }
            if let Ok(mut state) = watched.lock() {
                state.slots = weekly_progress(&reader, &view_settings, state.reference);
            }
        });

        Self {
            store,
            settings,
            state,
            _subscription: subscription,
        }
    }

    pub fn refresh(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.slots = weekly_progress(&self.store, &self.settings, state.reference);
        }
    }

    pub fn set_reference_date(&self, reference: NaiveDate) {
        if let Ok(mut state) = self.state.lock() {
            state.reference = reference;
            state.slots = weekly_progress(&self.store, &self.settings, reference);
        }
    }

    pub fn slots(&self) -> Vec<WeekSlot> {
        self.state
            .lock()
            .map(|state| state.slots.clone())
            .unwrap_or_default()
    }

    pub fn week_label(&self) -> String {
        let reference = self
            .state
            .lock()
            .map(|state| state.reference)
            .unwrap_or_else(|e| e.into_inner().reference);
        week_label(reference)
    }

    pub fn store(&self) -> &KeyedStore {
        &self.store
    }
}
