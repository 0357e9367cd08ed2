//! The key-value store capability behind persistence.
//!
//! The on-disk implementation lives in [`crate::db`]; [`MemoryStore`] is the
//! in-memory one used by tests and `--ephemeral` runs.

use crate::error::StorageError;
use std::collections::HashMap;

/// Storage key for the history list (JSON array of history items).
pub const HISTORY_KEY: &str = "moodtune.history";
/// Storage key for the ratings table (JSON object, song key -> 1..=5).
pub const RATINGS_KEY: &str = "moodtune.ratings";
/// Storage key for the theme literal (`light` or `dark`).
pub const THEME_KEY: &str = "moodtune.theme";

/// String-to-string store with last-write-wins semantics.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// `HashMap`-backed store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access for tests that need to plant corrupt values.
    pub fn insert_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
