//! SQLite-backed key-value store for data kept on this machine.
//!
//! This module provides:
//! - Database path resolution with an environment override
//! - Schema initialization with versioning
//! - One short-lived connection per operation, in WAL mode, so that the
//!   concurrent fan-out in the data service can write in parallel

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::{Backend, Collection, Store, StoreResult};

const DB_FILE_NAME: &str = "wattbook.db";
const MAX_OPEN_ATTEMPTS: u64 = 3;

/// Key-value persistence in a local SQLite file
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Open the store at `path`, or at the default location when `None`.
    ///
    /// The default honors `WATTBOOK_DB_PATH`, then falls back to
    /// `wattbook.db` in the platform data directory.
    pub fn open(path: Option<&Path>) -> StoreResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_db_path()?,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        let store = Self { path };
        // Fail early on an unusable path rather than on the first write
        store.connect()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection with WAL mode, retrying briefly on "database locked"
    fn connect(&self) -> StoreResult<Connection> {
        let mut attempts = 0;
        loop {
            match Connection::open(&self.path) {
                Ok(conn) => {
                    conn.pragma_update(None, "journal_mode", "WAL")?;
                    conn.pragma_update(None, "busy_timeout", 5000)?;
                    init_schema(&conn)?;
                    return Ok(conn);
                }
                Err(e) if e.to_string().contains("locked") && attempts < MAX_OPEN_ATTEMPTS => {
                    attempts += 1;
                    log::debug!("database locked, retry {attempts}/{MAX_OPEN_ATTEMPTS}");
                    thread::sleep(Duration::from_millis(100 * attempts));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Raw stored text for `key`
    pub fn read_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.connect()?;
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn write_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        let now = Utc::now().timestamp();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl Store for LocalStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    fn save(&self, collection: Collection, data: &Value) -> StoreResult<Value> {
        let text = serde_json::to_string(data)?;
        self.write_raw(collection.key(), &text)?;
        Ok(data.clone())
    }

    fn get(&self, collection: Collection, _query: &[(&str, &str)]) -> StoreResult<Option<Value>> {
        match self.read_raw(collection.key())? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn delete(&self, collection: Collection) -> StoreResult<()> {
        self.remove(collection.key())
    }

    fn clear(&self, collections: &[Collection]) -> StoreResult<()> {
        for collection in collections {
            self.remove(collection.key())?;
        }
        Ok(())
    }
}

fn default_db_path() -> StoreResult<PathBuf> {
    if let Ok(custom_path) = env::var("WATTBOOK_DB_PATH")
        && !custom_path.trim().is_empty()
    {
        return Ok(PathBuf::from(custom_path));
    }

    let dirs = directories::ProjectDirs::from("", "", "wattbook").ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory found")
    })?;
    Ok(dirs.data_dir().join(DB_FILE_NAME))
}

/// Create tables if they don't exist and record the schema version
fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', '1');",
    )?;
    Ok(())
}
