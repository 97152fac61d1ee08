use chrono::NaiveDate;
use devdash_lib::commands::goals::goal_crud;
use devdash_lib::commands::progress::{save_progress, weekly_progress, PROGRESS_KEY};
use devdash_lib::commands::resources::{resource_crud, RESOURCES_KEY};
use devdash_lib::commands::settings::{get_settings, save_settings, EffectiveSettings};
use devdash_lib::commands::workspace::open_workspace;
use devdash_lib::models::progress::ProgressEntry;
use devdash_lib::models::resource::Resource;
use devdash_lib::store::{KeyedStore, MemoryArea, SqliteArea, StorageEvent, StorageOrigin};
use serde_json::{json, Value};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

fn create_root() -> (TempDir, String) {
    devdash_lib::init_logging();
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let root = temp_dir.path().to_string_lossy().to_string();
    (temp_dir, root)
}

fn use_backend(root: &str, backend: &str) {
    save_settings(root, json!({ "backend": backend, "watchDebounceMs": 50 })).expect("save settings");
}

fn event_channel(store: &KeyedStore) -> (mpsc::Receiver<StorageEvent>, devdash_lib::store::Subscription) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let sub = store.subscribe(move |event: &StorageEvent| {
        if let Ok(tx) = tx.lock() {
            let _ = tx.send(event.clone());
        }
    });
    (rx, sub)
}

fn sample_entries() -> Vec<ProgressEntry> {
    vec![
        ProgressEntry::new(date("2025-11-03"), 50),
        ProgressEntry::new(date("2025-11-05"), 80),
        ProgressEntry::new(date("2025-11-05"), 10),
    ]
}

fn assert_round_trip(store: &KeyedStore) {
    let never_written: Vec<ProgressEntry> = store.load("neverWritten", vec![ProgressEntry::new(date("2025-01-01"), 1)]);
    assert_eq!(never_written, vec![ProgressEntry::new(date("2025-01-01"), 1)]);

    let entries = sample_entries();
    store.save(PROGRESS_KEY, &entries).expect("save entries");
    let loaded: Vec<ProgressEntry> = store.load(PROGRESS_KEY, Vec::new());
    assert_eq!(loaded, entries);

    let raw: Value = store.load(PROGRESS_KEY, Value::Null);
    assert_eq!(raw[0]["date"], json!("2025-11-03"));
    assert!(raw[0]["progress"].is_i64());
}

#[test]
fn round_trips_documents_on_every_backend() {
    let (_tmp, root) = create_root();

    assert_round_trip(&StorageOrigin::new(Arc::new(MemoryArea::new())).context());
    assert_round_trip(&StorageOrigin::new(Arc::new(SqliteArea::open_in_memory().expect("sqlite"))).context());

    let workspace = open_workspace(&root).expect("open workspace");
    assert_round_trip(&workspace.store);
}

#[test]
fn open_workspace_rejects_missing_directory() {
    let (_tmp, root) = create_root();
    let missing = format!("{root}/does-not-exist");

    let err = open_workspace(&missing).err().expect("missing dir fails");
    assert!(err.starts_with("PATH_NOT_FOUND"));
}

#[test]
fn file_workspace_reports_metadata_contract() {
    let (tmp, root) = create_root();
    let workspace = open_workspace(&root).expect("open workspace");
    assert!(workspace.is_watching());
    assert!(tmp.path().join(".devdash/settings.json").exists());

    goal_crud(&workspace.store, &workspace.settings, "delete", None, Some(1)).expect("delete goal");
    workspace.store.save(PROGRESS_KEY, &sample_entries()).expect("save entries");

    let meta = workspace.meta().expect("meta");
    assert_eq!(meta.path, root);
    assert_eq!(meta.backend, "file");
    assert_eq!(meta.keys, vec!["goals".to_string(), PROGRESS_KEY.to_string()]);
    assert_eq!(meta.document_count, 2);
    assert!(tmp.path().join(".devdash/documents/goals.json").exists());
}

#[test]
fn sqlite_workspace_persists_across_reopen() {
    let (tmp, root) = create_root();
    use_backend(&root, "sqlite");

    {
        let workspace = open_workspace(&root).expect("open workspace");
        assert!(!workspace.is_watching());
        resource_crud(
            &workspace.store,
            &workspace.settings,
            "create",
            Some(Resource {
                id: 0,
                title: "Rustonomicon".to_string(),
                link: "https://doc.rust-lang.org/nomicon/".to_string(),
                image: None,
            }),
            None,
        )
        .expect("create resource");
    }

    assert!(tmp.path().join(".devdash/state.db").exists());
    let reopened = open_workspace(&root).expect("reopen workspace");
    let resources: Vec<Resource> = reopened.store.load(RESOURCES_KEY, Vec::new());
    assert_eq!(resources.len(), 3);
    assert_eq!(reopened.meta().expect("meta").backend, "sqlite");

    // A second context on the reopened origin hears writes from the first.
    let second_tab = reopened.open_context();
    assert_ne!(second_tab.context_id(), reopened.store.context_id());
    let (second_rx, _second_sub) = event_channel(&second_tab);
    save_progress(&reopened.store, &reopened.settings, date("2025-11-07"), 30, date("2025-11-07"))
        .expect("save progress");
    assert_eq!(second_rx.try_recv().expect("second context notified").key, PROGRESS_KEY);
    assert_eq!(weekly_progress(&second_tab, &reopened.settings, date("2025-11-07"))[4].progress, 30);
}

#[test]
fn settings_commands_round_trip_and_merge_partial_updates() {
    let (_tmp, root) = create_root();

    let initial = get_settings(&root).expect("load settings");
    assert_eq!(initial["backend"], json!("file"));

    let saved = save_settings(&root, json!({ "lockPastDays": false })).expect("save settings");
    assert_eq!(saved["lockPastDays"], json!(false));
    assert_eq!(saved["backend"], initial["backend"]);
    assert_eq!(saved["watchDebounceMs"], initial["watchDebounceMs"]);
}

#[test]
fn contexts_in_one_process_see_each_others_writes_only() {
    let origin = StorageOrigin::new(Arc::new(MemoryArea::new()));
    let dashboard_tab = origin.context();
    let analytics_tab = origin.context();
    let settings = EffectiveSettings {
        seed_defaults: false,
        ..EffectiveSettings::default()
    };

    let (dashboard_rx, _dashboard_sub) = event_channel(&dashboard_tab);
    let (analytics_rx, _analytics_sub) = event_channel(&analytics_tab);

    save_progress(&analytics_tab, &settings, date("2025-11-05"), 80, date("2025-11-03")).expect("save");

    let event = dashboard_rx.try_recv().expect("dashboard notified");
    assert_eq!(event.key, PROGRESS_KEY);
    assert_eq!(event.source, analytics_tab.context_id());
    assert!(analytics_rx.try_recv().is_err());

    let week = weekly_progress(&dashboard_tab, &settings, date("2025-11-03"));
    assert_eq!(week[2].progress, 80);
}

#[test]
fn file_watcher_delivers_writes_from_another_process() {
    let (_tmp, root) = create_root();
    use_backend(&root, "file");

    // Two workspaces on one directory stand in for two processes.
    let writer = open_workspace(&root).expect("open writer");
    let reader = open_workspace(&root).expect("open reader");
    let (reader_rx, _reader_sub) = event_channel(&reader.store);
    let (writer_rx, _writer_sub) = event_channel(&writer.store);

    writer
        .store
        .save(PROGRESS_KEY, &sample_entries())
        .expect("save entries");

    let event = reader_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("reader notified through the watcher");
    assert_eq!(event.key, PROGRESS_KEY);
    assert!(event.source.is_external());

    let loaded: Vec<ProgressEntry> = reader.store.load(PROGRESS_KEY, Vec::new());
    assert_eq!(loaded, sample_entries());

    // The writer's own watcher drops the echo of its write.
    assert!(writer_rx.recv_timeout(Duration::from_millis(500)).is_err());
}
