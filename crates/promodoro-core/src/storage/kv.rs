//! Durable key-value slot for in-flight timer state.
//!
//! The timer core only needs a small per-device get/set/remove surface that
//! survives restarts. `Store` backs it with SQLite; `MemoryKv` is the
//! in-process stand-in for tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::data_dir;
use crate::error::StorageError;

/// Small durable key-value capability, scoped to this device.
pub trait PersistentKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed store at `~/.config/promodoro/promodoro.db`.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store, creating the file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?
            .join("promodoro.db");
        Self::open_at(&path)
    }

    /// Open a store at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl PersistentKv for Store {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory KV for tests. Interior mutability keeps the trait surface
/// identical to the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryKv {
    map: Mutex<HashMap<String, String>>,
}

impl PersistentKv for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(kv: &dyn PersistentKv) {
        assert!(kv.get("timer_state").unwrap().is_none());
        kv.set("timer_state", "{}").unwrap();
        assert_eq!(kv.get("timer_state").unwrap().unwrap(), "{}");
        kv.set("timer_state", "{\"phase\":\"focus\"}").unwrap();
        assert_eq!(
            kv.get("timer_state").unwrap().unwrap(),
            "{\"phase\":\"focus\"}"
        );
        kv.remove("timer_state").unwrap();
        assert!(kv.get("timer_state").unwrap().is_none());
        // Removing a missing key is fine.
        kv.remove("timer_state").unwrap();
    }

    #[test]
    fn sqlite_store_roundtrip() {
        let store = Store::open_memory().unwrap();
        exercise(&store);
    }

    #[test]
    fn memory_kv_roundtrip() {
        let kv = MemoryKv::default();
        exercise(&kv);
    }
}
