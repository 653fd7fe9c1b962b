//! Persistence collaborators: the settings key/value store and the
//! scheduled-task record store.
//!
//! [`SqliteStore`] backs both with one database file. [`MemoryStore`] keeps
//! everything in process and is what the tests (and `--no-store` runs) use.

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

const SCHEMA_VERSION: i32 = 2;
const DB_BUSY_TIMEOUT_SECS: u64 = 30;

/// Key/value settings updater
pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn update(&self, key: &str, value: &str) -> Result<()>;
}

/// Scheduled-task execution records, keyed by the log file they reference
pub trait TaskRecordStore {
    /// Delete every record whose file is `path` or lies beneath it.
    /// Returns the number of records removed.
    fn delete_records_for(&self, path: &Path) -> Result<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: i64,
    pub task_name: String,
    pub record_file: PathBuf,
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<HashMap<String, String>>,
    records: Mutex<Vec<TaskRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task_record(&self, task_name: &str, record_file: &Path) -> i64 {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        records.push(TaskRecord {
            id,
            task_name: task_name.to_string(),
            record_file: record_file.to_path_buf(),
        });
        id
    }

    pub fn task_records(&self) -> Vec<TaskRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let settings = self.settings.lock().unwrap_or_else(|e| e.into_inner());
        Ok(settings.get(key).cloned())
    }

    fn update(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = self.settings.lock().unwrap_or_else(|e| e.into_inner());
        settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl TaskRecordStore for MemoryStore {
    fn delete_records_for(&self, path: &Path) -> Result<usize> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|r| !r.record_file.starts_with(path));
        Ok(before - records.len())
    }
}

/// SQLite-backed store
pub struct SqliteStore {
    db: Connection,
}

impl SqliteStore {
    /// Open or create the store database
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Connection::open(db_path)?;

        // WAL lets the panel read settings while a clean is writing them
        db.pragma_update(None, "journal_mode", "WAL")?;
        db.busy_timeout(Duration::from_secs(DB_BUSY_TIMEOUT_SECS))?;
        db.pragma_update(None, "synchronous", "NORMAL")?;

        let mut store = Self { db };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self {
            db: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&mut self) -> Result<()> {
        self.db.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
            [],
        )?;
        let version: Option<i32> = self
            .db
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        let version = match version {
            Some(v) => v,
            None => {
                self.db
                    .execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
                0
            }
        };

        if version < SCHEMA_VERSION {
            self.migrate_schema(version)?;
        }

        Ok(())
    }

    fn migrate_schema(&mut self, from_version: i32) -> Result<()> {
        let tx = self.db.transaction()?;

        if from_version < 1 {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS settings (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                )",
                [],
            )?;
            tx.execute("UPDATE schema_version SET version = ?1", [1])?;
        }

        if from_version < 2 {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS task_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task_name TEXT NOT NULL,
                    record_file TEXT NOT NULL,
                    created_at INTEGER NOT NULL
                )",
                [],
            )?;
            tx.execute(
                "CREATE INDEX IF NOT EXISTS idx_record_file ON task_records(record_file)",
                [],
            )?;
            tx.execute("UPDATE schema_version SET version = ?1", [2])?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn add_task_record(&self, task_name: &str, record_file: &Path) -> Result<i64> {
        self.db.execute(
            "INSERT INTO task_records (task_name, record_file, created_at) VALUES (?1, ?2, ?3)",
            params![
                task_name,
                record_file.to_string_lossy().into_owned(),
                chrono::Utc::now().timestamp()
            ],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    pub fn list_task_records(&self) -> Result<Vec<TaskRecord>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, task_name, record_file FROM task_records ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskRecord {
                id: row.get(0)?,
                task_name: row.get(1)?,
                record_file: PathBuf::from(row.get::<_, String>(2)?),
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

impl SettingsStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn update(&self, key: &str, value: &str) -> Result<()> {
        self.db.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }
}

impl TaskRecordStore for SqliteStore {
    fn delete_records_for(&self, path: &Path) -> Result<usize> {
        let exact = path.to_string_lossy().trim_end_matches('/').to_string();
        let beneath = format!("{}/%", escape_like(&exact));
        let removed = self.db.execute(
            "DELETE FROM task_records WHERE record_file = ?1 OR record_file LIKE ?2 ESCAPE '\\'",
            params![exact, beneath],
        )?;
        Ok(removed)
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_overwrite() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("LastCleanSize").unwrap(), None);

        store.update("LastCleanSize", "10").unwrap();
        store.update("LastCleanSize", "20").unwrap();
        assert_eq!(store.get("LastCleanSize").unwrap(), Some("20".to_string()));
    }

    #[test]
    fn test_open_file_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("db/clean.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store.update("LastCleanData", "3").unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.get("LastCleanData").unwrap(), Some("3".to_string()));
    }

    #[test]
    fn test_delete_records_exact_and_beneath() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .add_task_record("backup", Path::new("/opt/1panel/task/shell/a.log"))
            .unwrap();
        store
            .add_task_record("backup", Path::new("/opt/1panel/task/shell/b.log"))
            .unwrap();
        store
            .add_task_record("curl", Path::new("/opt/1panel/task/shell_2/c.log"))
            .unwrap();

        let removed = store
            .delete_records_for(Path::new("/opt/1panel/task/shell/a.log"))
            .unwrap();
        assert_eq!(removed, 1);

        let removed = store
            .delete_records_for(Path::new("/opt/1panel/task/shell"))
            .unwrap();
        assert_eq!(removed, 1);

        let left = store.list_task_records().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].task_name, "curl");
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .add_task_record("t", Path::new("/task/a_b/x.log"))
            .unwrap();
        store
            .add_task_record("t", Path::new("/task/aXb/x.log"))
            .unwrap();

        store.delete_records_for(Path::new("/task/a_b")).unwrap();
        let left = store.list_task_records().unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].record_file, PathBuf::from("/task/aXb/x.log"));
    }

    #[test]
    fn test_memory_store_records() {
        let store = MemoryStore::new();
        store.add_task_record("t", Path::new("/task/shell/1.log"));
        store.add_task_record("t", Path::new("/task/other/2.log"));

        assert_eq!(store.delete_records_for(Path::new("/task/shell")).unwrap(), 1);
        assert_eq!(store.task_records().len(), 1);
    }
}
