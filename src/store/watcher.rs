use super::area::StorageArea;
use super::bus::{ContextId, StorageEvent};
use super::file::FileArea;
use super::keyed::StorageOrigin;
use crate::errors::StoreResult;
use log::{debug, warn};
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::collections::BTreeSet;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Publishes changes made to a `FileArea` by other processes.
///
/// Stops watching when dropped.
pub struct OriginWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
}

impl OriginWatcher {
    pub fn start(
        area: Arc<FileArea>,
        origin: Arc<StorageOrigin>,
        debounce: Duration,
    ) -> StoreResult<Self> {
        let (tx, rx) = mpsc::channel::<DebounceEventResult>();

        let mut debouncer = new_debouncer(debounce, tx)?;
        debouncer
            .watcher()
            .watch(area.dir(), RecursiveMode::NonRecursive)?;

        debug!("watching {} for external writes", area.dir().display());

        std::thread::spawn(move || loop {
            match rx.recv_timeout(Duration::from_millis(500)) {
                Ok(Ok(events)) => {
                    let keys: BTreeSet<String> = events
                        .iter()
                        .filter_map(|event| area.key_for_path(&event.path))
                        .collect();
                    for key in keys {
                        forward_change(&area, &origin, &key);
                    }
                }
                Ok(Err(e)) => warn!("watch error on {}: {e:?}", area.dir().display()),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        });

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

fn forward_change(area: &FileArea, origin: &StorageOrigin, key: &str) {
    let current = match area.get_item(key) {
        Ok(current) => current,
        Err(e) => {
            warn!("could not read changed document '{key}': {e}");
            return;
        }
    };

    if area.is_known_content(key, current.as_deref()) {
        return;
    }
    area.note_content(key, current.as_deref());

    origin.publish(&StorageEvent {
        key: key.to_string(),
        new_value: current,
        source: ContextId::EXTERNAL,
    });
}
