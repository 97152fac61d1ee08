use log::warn;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 2;

pub const DATA_DIR: &str = ".devdash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    File,
    Sqlite,
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::File => "file",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "file" => Some(BackendKind::File),
            "sqlite" => Some(BackendKind::Sqlite),
            "memory" => Some(BackendKind::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub backend: BackendKind,
    pub watch_debounce: Duration,
    pub seed_defaults: bool,
    pub lock_past_days: bool,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        effective_from_value(&default_settings())
    }
}

pub fn get_settings(workspace_path: &str) -> Result<Value, String> {
    load_settings_from_disk(workspace_path)
}

pub fn save_settings(workspace_path: &str, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(workspace_path, settings)
}

pub fn load_effective_settings(workspace_path: &str) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(workspace_path)?;
    Ok(effective_from_value(&settings))
}

fn effective_from_value(settings: &Value) -> EffectiveSettings {
    let backend = settings
        .get("backend")
        .and_then(Value::as_str)
        .and_then(BackendKind::parse)
        .unwrap_or(BackendKind::File);

    let debounce_ms = settings
        .get("watchDebounceMs")
        .and_then(Value::as_u64)
        .unwrap_or(250)
        .clamp(50, 5000);

    EffectiveSettings {
        backend,
        watch_debounce: Duration::from_millis(debounce_ms),
        seed_defaults: settings
            .get("seedDefaults")
            .and_then(Value::as_bool)
            .unwrap_or(true),
        lock_past_days: settings
            .get("lockPastDays")
            .and_then(Value::as_bool)
            .unwrap_or(true),
    }
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value, String> {
    let file = SettingsFile::open(workspace_path)?;
    let stored = file.read()?;

    let migrated = migrate_settings(stored.clone().unwrap_or_else(|| json!({})));
    if stored.as_ref() != Some(&migrated) {
        file.write(&migrated)?;
    }
    Ok(migrated)
}

/// Applies the top-level keys of `changes` over the stored settings.
pub fn save_settings_to_disk(workspace_path: &str, changes: Value) -> Result<Value, String> {
    let Value::Object(changes) = changes else {
        return Err("Settings update must be a JSON object".to_string());
    };

    let mut settings = match load_settings_from_disk(workspace_path)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in changes {
        if key != "schema_version" {
            settings.insert(key, value);
        }
    }

    let migrated = migrate_settings(Value::Object(settings));
    SettingsFile::open(workspace_path)?.write(&migrated)?;
    Ok(migrated)
}

pub fn data_dir(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path).join(DATA_DIR)
}

/// `<root>/.devdash/settings.json`; opening it creates the data directory.
struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    fn open(workspace_path: &str) -> Result<Self, String> {
        let dir = data_dir(workspace_path);
        fs::create_dir_all(&dir).map_err(|e| format!("Failed to create {DATA_DIR} directory: {e}"))?;
        Ok(Self {
            path: dir.join("settings.json"),
        })
    }

    /// `None` when the file does not exist. Unparseable text reads as `null`.
    fn read(&self) -> Result<Option<Value>, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("Failed to read settings.json: {e}")),
        };
        Ok(Some(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("settings.json is malformed, resetting to defaults: {e}");
            Value::Null
        })))
    }

    fn write(&self, settings: &Value) -> Result<(), String> {
        let raw = serde_json::to_string_pretty(settings)
            .map_err(|e| format!("Failed to serialize settings: {e}"))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|e| format!("Failed to write settings.json: {e}"))?;
        fs::rename(&tmp, &self.path).map_err(|e| format!("Failed to replace settings.json: {e}"))
    }
}

/// What a settings key accepts; anything else is replaced by its default.
#[derive(Debug, Clone, Copy)]
enum Rule {
    OneOf(&'static [&'static str], &'static str),
    Millis { min: u64, max: u64, default: u64 },
    Flag(bool),
}

impl Rule {
    fn apply(self, raw: Option<&Value>) -> Value {
        match self {
            Rule::OneOf(allowed, default) => json!(raw
                .and_then(Value::as_str)
                .filter(|value| allowed.contains(value))
                .unwrap_or(default)),
            Rule::Millis { min, max, default } => {
                json!(raw.and_then(Value::as_u64).unwrap_or(default).clamp(min, max))
            }
            Rule::Flag(default) => json!(raw.and_then(Value::as_bool).unwrap_or(default)),
        }
    }
}

const SETTING_RULES: [(&str, Rule); 4] = [
    ("backend", Rule::OneOf(&["file", "sqlite", "memory"], "file")),
    (
        "watchDebounceMs",
        Rule::Millis {
            min: 50,
            max: 5000,
            default: 250,
        },
    ),
    ("seedDefaults", Rule::Flag(true)),
    // Added in v2; older documents pick up the default.
    ("lockPastDays", Rule::Flag(true)),
];

fn migrate_settings(input: Value) -> Value {
    let mut settings = match input {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let version = settings
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    // v0 and v1 documents may still name the backend `storage`.
    if version < 2 {
        if let Some(legacy) = settings.remove("storage") {
            settings.entry("backend").or_insert(legacy);
        }
    }

    for (key, rule) in SETTING_RULES {
        let value = rule.apply(settings.get(key));
        settings.insert(key.to_string(), value);
    }
    settings.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));

    Value::Object(settings)
}

fn default_settings() -> Value {
    migrate_settings(json!({ "schema_version": SETTINGS_SCHEMA_VERSION }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> (tempfile::TempDir, String) {
        let tmp = tempfile::tempdir().expect("temp dir");
        let root = tmp.path().to_string_lossy().to_string();
        (tmp, root)
    }

    fn settings_file(root: &str) -> PathBuf {
        data_dir(root).join("settings.json")
    }

    #[test]
    fn defaults_cover_every_key() {
        assert_eq!(
            default_settings(),
            json!({
                "schema_version": 2,
                "backend": "file",
                "watchDebounceMs": 250,
                "seedDefaults": true,
                "lockPastDays": true
            })
        );
    }

    #[test]
    fn migrates_legacy_storage_key_and_stamps_version() {
        let migrated = migrate_settings(json!({ "storage": "sqlite", "watchDebounceMs": 10 }));

        assert_eq!(migrated["backend"], json!("sqlite"));
        assert!(migrated.get("storage").is_none());
        assert_eq!(migrated["watchDebounceMs"], json!(50));
        assert_eq!(migrated["lockPastDays"], json!(true));
        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION));
    }

    #[test]
    fn version_one_documents_also_rename_storage() {
        let migrated = migrate_settings(json!({ "schema_version": 1, "storage": "sqlite" }));

        assert_eq!(migrated["backend"], json!("sqlite"));
        assert!(migrated.get("storage").is_none());
        assert_eq!(effective_from_value(&migrated).backend, BackendKind::Sqlite);

        // An explicit backend wins over the legacy key.
        let both = migrate_settings(json!({ "schema_version": 1, "storage": "sqlite", "backend": "memory" }));
        assert_eq!(both["backend"], json!("memory"));
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let migrated = migrate_settings(json!({
            "schema_version": 2,
            "backend": "redis",
            "seedDefaults": "yes",
            "watchDebounceMs": -3
        }));

        assert_eq!(migrated["backend"], json!("file"));
        assert_eq!(migrated["seedDefaults"], json!(true));
        assert_eq!(migrated["watchDebounceMs"], json!(250));
    }

    #[test]
    fn partial_saves_keep_existing_values() {
        let (_tmp, root) = temp_root();
        save_settings_to_disk(&root, json!({ "backend": "sqlite", "theme": "dark" })).expect("first save");

        let saved = save_settings_to_disk(&root, json!({ "lockPastDays": false, "schema_version": 0 }))
            .expect("second save");
        assert_eq!(saved["backend"], json!("sqlite"));
        assert_eq!(saved["theme"], json!("dark"));
        assert_eq!(saved["lockPastDays"], json!(false));
        assert_eq!(saved["schema_version"], json!(SETTINGS_SCHEMA_VERSION));

        assert!(save_settings_to_disk(&root, json!(["backend"])).is_err());
    }

    #[test]
    fn effective_settings_are_typed() {
        let effective = effective_from_value(&json!({
            "backend": "memory",
            "watchDebounceMs": 900,
            "seedDefaults": false,
            "lockPastDays": false
        }));

        assert_eq!(effective.backend, BackendKind::Memory);
        assert_eq!(effective.watch_debounce, Duration::from_millis(900));
        assert!(!effective.seed_defaults);
        assert!(!effective.lock_past_days);
    }

    #[test]
    fn unreadable_file_is_replaced_with_defaults() {
        let (_tmp, root) = temp_root();
        fs::create_dir_all(data_dir(&root)).unwrap();
        fs::write(settings_file(&root), "{ nope").unwrap();

        let loaded = load_settings_from_disk(&root).expect("load");
        assert_eq!(loaded, default_settings());

        let on_disk: Value = serde_json::from_str(&fs::read_to_string(settings_file(&root)).unwrap()).unwrap();
        assert_eq!(on_disk, default_settings());
        assert!(!data_dir(&root).join("settings.json.tmp").exists());
    }
}
