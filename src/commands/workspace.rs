use crate::commands::settings::{data_dir, load_effective_settings, BackendKind, EffectiveSettings};
use crate::models::workspace::WorkspaceMeta;
use crate::store::{FileArea, KeyedStore, MemoryArea, OriginWatcher, SqliteArea, StorageOrigin};
use log::info;
use std::path::Path;
use std::sync::Arc;

pub const DOCUMENTS_DIR: &str = "documents";
pub const DATABASE_FILE: &str = "state.db";

/// An opened dashboard root: its settings, storage origin and watcher.
pub struct Workspace {
    pub path: String,
    pub settings: EffectiveSettings,
    pub store: KeyedStore,
    watcher: Option<OriginWatcher>,
}

impl Workspace {
    pub fn origin(&self) -> &Arc<StorageOrigin> {
        self.store.origin()
    }

    /// A fresh context on this workspace's origin.
    pub fn open_context(&self) -> KeyedStore {
        self.store.sibling()
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn meta(&self) -> Result<WorkspaceMeta, String> {
        let keys = self
            .store
            .keys()
            .map_err(|e| format!("Could not list documents: {e}"))?;
        Ok(WorkspaceMeta {
            path: self.path.clone(),
            backend: self.origin().kind().to_string(),
            document_count: keys.len(),
            keys,
        })
    }
}

pub fn open_workspace(path: &str) -> Result<Workspace, String> {
    let workspace_path = Path::new(path);

    if !workspace_path.is_dir() {
        return Err("PATH_NOT_FOUND: Directory does not exist".to_string());
    }

    // Creates .devdash and settings.json with defaults/migrations.
    let settings = load_effective_settings(path)
        .map_err(|e| format!("INIT_FAILED: Could not initialize settings: {e}"))?;

    let (origin, watcher) = match settings.backend {
        BackendKind::File => {
            let area = Arc::new(
                FileArea::open(data_dir(path).join(DOCUMENTS_DIR))
                    .map_err(|e| format!("INIT_FAILED: {e}"))?,
            );
            let origin = StorageOrigin::new(area.clone());
            let watcher = OriginWatcher::start(area, Arc::clone(&origin), settings.watch_debounce)
                .map_err(|e| format!("INIT_FAILED: Could not watch documents: {e}"))?;
            (origin, Some(watcher))
        }
        BackendKind::Sqlite => {
            let area = SqliteArea::open(&data_dir(path).join(DATABASE_FILE))
                .map_err(|e| format!("INIT_FAILED: Could not initialize database: {e}"))?;
            (StorageOrigin::new(Arc::new(area)), None)
        }
        BackendKind::Memory => (StorageOrigin::new(Arc::new(MemoryArea::new())), None),
    };

    info!("opened workspace {path} with {} backend", origin.kind());

    Ok(Workspace {
        path: path.to_string(),
        settings,
        store: origin.context(),
        watcher,
    })
}
