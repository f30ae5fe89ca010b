use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{StoreError, StoreResult};

/// String key/value store holding the durable snapshot.
pub trait Storage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()>;

    fn describe(&self) -> String;
}

pub fn default_db_path() -> PathBuf {
    let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home_dir).join(".csm_buddy.db")
}

pub struct SqliteStorage {
    conn: Connection,
    path: PathBuf,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let storage = SqliteStorage { conn, path: path.to_path_buf() };
        storage.create_schema()?;
        log::debug!("Opened store database at {}", path.display());
        Ok(storage)
    }

    fn create_schema(&self) -> StoreResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            [key, value],
        )?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Default)]
struct MemoryInner {
    items: HashMap<String, String>,
    writes: usize,
    quota: Option<usize>,
}

/// Volatile storage. Clones share the same map, so a test can keep a handle
/// and inspect what the store wrote.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_item(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage.inner.borrow_mut().items.insert(key.to_string(), value.to_string());
        storage
    }

    /// Rejects writes larger than `limit` bytes, like a full browser quota.
    #[cfg(test)]
    pub fn set_quota(&self, limit: Option<usize>) {
        self.inner.borrow_mut().quota = limit;
    }

    /// Successful writes so far.
    #[cfg(test)]
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    pub fn item(&self, key: &str) -> Option<String> {
        self.inner.borrow().items.get(key).cloned()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.item(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut inner = self.inner.borrow_mut();
        if let Some(limit) = inner.quota {
            if value.len() > limit {
                return Err(StoreError::QuotaExceeded { needed: value.len(), limit });
            }
        }
        inner.items.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
