use super::area::StorageArea;
use crate::errors::{StoreError, StoreResult};
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DB_SCHEMA_VERSION: i64 = 2;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        // Newer writer; the documents table stays readable.
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT 0
        );
        ",
    )
}

/// Adds the per-document write counter. Safe to re-run on a table that
/// already has it.
fn apply_migration_2(conn: &Connection) -> Result<()> {
    if !documents_have_column(conn, "revision")? {
        conn.execute_batch("ALTER TABLE documents ADD COLUMN revision INTEGER NOT NULL DEFAULT 0;")?;
    }
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_documents_updated_at ON documents(updated_at);",
    )
}

fn documents_have_column(conn: &Connection, column: &str) -> Result<bool> {
    conn.prepare("SELECT 1 FROM pragma_table_info('documents') WHERE name = ?1")?
        .exists(params![column])
}

/// Documents kept as rows of a single SQLite table.
#[derive(Debug)]
pub struct SqliteArea {
    conn: Mutex<Connection>,
}

impl SqliteArea {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of times `key` has been written, 0 if never.
    pub fn revision(&self, key: &str) -> StoreResult<i64> {
        let revision = self
            .conn()?
            .query_row(
                "SELECT revision FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(revision.unwrap_or(0))
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::LockPoisoned("sqlite connection"))
    }
}

impl StorageArea for SqliteArea {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let now = chrono::Utc::now().timestamp();
        self.conn()?.execute(
            "
            INSERT INTO documents (key, value, updated_at, revision)
            VALUES (?1, ?2, ?3, 1)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                revision = documents.revision + 1
            ",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        self.conn()?
            .execute("DELETE FROM documents WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key FROM documents ORDER BY key ASC")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(keys)
    }

    fn kind(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_initializes_with_expected_version() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        initialize_schema(&conn).expect("schema init");
        let version: i64 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("schema version");
        assert_eq!(version, DB_SCHEMA_VERSION);
    }

    #[test]
    fn migrates_version_one_table_without_revision_column() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        apply_migration_1(&conn).expect("v1");
        conn.pragma_update(None, "user_version", 1).expect("set version");
        conn.execute(
            "INSERT INTO documents (key, value, updated_at) VALUES ('goals', '[]', 0)",
            [],
        )
        .expect("seed v1 row");

        assert!(!documents_have_column(&conn, "revision").expect("table info"));

        let area = SqliteArea::from_connection(conn).expect("migrate");
        assert_eq!(area.get_item("goals").unwrap().as_deref(), Some("[]"));
        assert_eq!(area.revision("goals").unwrap(), 0);
    }

    #[test]
    fn revision_migration_can_run_twice() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        initialize_schema(&conn).expect("schema init");
        apply_migration_2(&conn).expect("re-run v2");
        assert!(documents_have_column(&conn, "revision").expect("table info"));
    }

    #[test]
    fn upsert_replaces_value_and_bumps_revision() {
        let area = SqliteArea::open_in_memory().expect("open");
        area.set_item("progressEntries", "[]").unwrap();
        area.set_item("progressEntries", "[{\"date\":\"2025-11-05\",\"progress\":80}]")
            .unwrap();

        assert_eq!(area.revision("progressEntries").unwrap(), 2);
        assert!(area
            .get_item("progressEntries")
            .unwrap()
            .unwrap()
            .contains("2025-11-05"));

        area.set_item("goals", "[]").unwrap();
        assert_eq!(area.keys().unwrap(), vec!["goals", "progressEntries"]);

        area.remove_item("goals").unwrap();
        assert_eq!(area.get_item("goals").unwrap(), None);
        assert_eq!(area.revision("goals").unwrap(), 0);
    }
}
