//! SQLite-backed key-value store.
//!
//! One table, `kv`, holding the three persisted records. This is the
//! durable stand-in for browser local storage.

use crate::error::StorageError;
use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use log::{debug, trace};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Durable [`KeyValueStore`] over a single SQLite file.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path` and make sure the table exists.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open store database at {}", db_path.display()))?;
        debug!("Opened store at {}", db_path.display());
        Self::init(conn)
    }

    /// Store backed by a private in-memory SQLite database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create kv table")?;

        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        trace!("get `{key}' -> {}", if value.is_some() { "hit" } else { "miss" });
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        trace!("set `{key}' ({} bytes)", value.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        trace!("remove `{key}'");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{HISTORY_KEY, THEME_KEY};

    #[test]
    fn test_set_overwrites_existing_value() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set(THEME_KEY, "light").unwrap();
        store.set(THEME_KEY, "dark").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn test_remove_deletes_key() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set(HISTORY_KEY, "[]").unwrap();
        store.remove(HISTORY_KEY).unwrap();
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
        // Removing again is fine
        store.remove(HISTORY_KEY).unwrap();
    }
}
