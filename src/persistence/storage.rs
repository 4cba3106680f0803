//! Storage capability consumed by the persistence gateway.

use crate::core::error::PersistenceError;
use serde_json::Value;
use std::collections::BTreeMap;

/// Appended to a key whose value could not be loaded.
pub const CORRUPT_SUFFIX: &str = "-corrupt";

/// Key-value store of structured data.
///
/// Implementations must make `set` all-or-nothing: a reader never observes a
/// partially written value.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError>;
    /// Returns whether a value was present.
    fn delete(&mut self, key: &str) -> Result<bool, PersistenceError>;
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;

    /// Moves the value under `key` aside so the key can be written fresh.
    /// Returns where it now lives, `None` when nothing was stored.
    fn quarantine(&mut self, key: &str) -> Result<Option<String>, PersistenceError> {
        let Some(value) = self.get(key)? else {
            return Ok(None);
        };
        let target = format!("{}{}", key, CORRUPT_SUFFIX);
        self.set(&target, value)?;
        self.delete(key)?;
        Ok(Some(target))
    }

    /// Older readable copies of `key`, newest first.
    fn backups(&self, _key: &str) -> Result<Vec<Value>, PersistenceError> {
        Ok(Vec::new())
    }
}

/// In-memory storage for tests and headless simulation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Storage for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, PersistenceError> {
        Ok(self.values.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        Ok(self.values.keys().cloned().collect())
    }
}
