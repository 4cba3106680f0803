//! Versioned save/load of engine state over a pluggable [`Storage`].
//!
//! Every engine is written under its own key, wrapped in a [`SaveEnvelope`]
//! carrying the format version and the save time. Values written before the
//! envelope existed (a bare engine object) load as version 0.
//!
//! A key that cannot be read is moved aside and replaced by its newest
//! readable backup, or by fresh state when there is none; the other keys
//! load normally.

mod export;
mod file_store;
mod storage;

pub use export::SaveExport;
pub use file_store::{default_save_dir, load_json_or_default, validate_key, FileStore};
pub use storage::{MemoryStore, Storage, CORRUPT_SUFFIX};

use crate::core::constants::SAVE_FORMAT_VERSION;
use crate::core::error::PersistenceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Engine state that is saved as one unit under a fixed key.
pub trait Persistent: Serialize + DeserializeOwned {
    const SAVE_KEY: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    /// Unix milliseconds.
    pub saved_at: i64,
    pub data: Value,
}

impl SaveEnvelope {
    fn parse(raw: Value) -> SaveEnvelope {
        let is_envelope = raw
            .as_object()
            .map(|obj| obj.contains_key("version") && obj.contains_key("data"))
            .unwrap_or(false);

        if is_envelope {
            if let Ok(envelope) = serde_json::from_value::<SaveEnvelope>(raw.clone()) {
                return envelope;
            }
        }

        SaveEnvelope {
            version: 0,
            saved_at: 0,
            data: raw,
        }
    }

    fn wrap<T: Serialize>(value: &T, now: i64) -> Result<SaveEnvelope, PersistenceError> {
        Ok(SaveEnvelope {
            version: SAVE_FORMAT_VERSION,
            saved_at: now,
            data: serde_json::to_value(value)?,
        })
    }

    /// Checks the version and deserializes the payload.
    fn decode<T: DeserializeOwned>(self, key: &str) -> Result<T, PersistenceError> {
        if self.version > SAVE_FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                key: key.to_string(),
                found: self.version,
                current: SAVE_FORMAT_VERSION,
            });
        }
        if self.version < SAVE_FORMAT_VERSION {
            tracing::info!(
                key,
                from = self.version,
                to = SAVE_FORMAT_VERSION,
                "migrating save"
            );
        }
        Ok(serde_json::from_value(self.data)?)
    }
}

/// A key that failed to load and what was done about it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWarning {
    pub key: String,
    pub error: String,
    /// Where the unreadable value was moved, if it could be moved.
    pub preserved_as: Option<String>,
    /// Whether an older backup replaced it. Otherwise the engine starts fresh.
    pub restored_backup: bool,
}

/// Version and time of the stored save under one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveInfo {
    pub key: String,
    pub version: u32,
    /// Unix milliseconds, 0 for legacy saves.
    pub saved_at: i64,
}

pub struct PersistenceGateway {
    storage: Box<dyn Storage>,
}

impl PersistenceGateway {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Serializes `value` completely, then stores it in a single write.
    pub fn save<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        now: i64,
    ) -> Result<(), PersistenceError> {
        let envelope = SaveEnvelope::wrap(value, now)?;
        self.storage.set(key, serde_json::to_value(&envelope)?)
    }

    /// Loads a value, `Ok(None)` if the key was never written.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PersistenceError> {
        match self.storage.get(key)? {
            Some(raw) => SaveEnvelope::parse(raw).decode(key).map(Some),
            None => Ok(None),
        }
    }

    /// Loads a value, recovering from an unreadable one instead of failing.
    ///
    /// The bad value is quarantined in storage, then the newest backup that
    /// decodes is used. `None` with a warning means no copy could be read.
    pub fn load_or_recover<T: DeserializeOwned>(
        &mut self,
        key: &str,
    ) -> (Option<T>, Option<LoadWarning>) {
        let error = match self.load(key) {
            Ok(value) => return (value, None),
            Err(e) => e,
        };
        tracing::warn!(key, error = %error, "save unreadable, recovering");

        let preserved_as = self.storage.quarantine(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "could not move unreadable save aside");
            None
        });
        let backups = self.storage.backups(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "could not list backups");
            Vec::new()
        });
        let restored = backups
            .into_iter()
            .find_map(|raw| SaveEnvelope::parse(raw).decode::<T>(key).ok());

        match &restored {
            Some(_) => tracing::info!(key, "restored save from backup"),
            None => tracing::warn!(key, "no readable backup, starting fresh"),
        }
        let warning = LoadWarning {
            key: key.to_string(),
            error: error.to_string(),
            preserved_as,
            restored_backup: restored.is_some(),
        };
        (restored, Some(warning))
    }

    /// Time of the last save under `key`, if it was written with an envelope.
    pub fn saved_at(&self, key: &str) -> Result<Option<i64>, PersistenceError> {
        Ok(self
            .info(key)?
            .filter(|info| info.version > 0)
            .map(|info| info.saved_at))
    }

    pub fn info(&self, key: &str) -> Result<Option<SaveInfo>, PersistenceError> {
        Ok(self.storage.get(key)?.map(|raw| {
            let envelope = SaveEnvelope::parse(raw);
            SaveInfo {
                key: key.to_string(),
                version: envelope.version,
                saved_at: envelope.saved_at,
            }
        }))
    }

    pub fn delete(&mut self, key: &str) -> Result<bool, PersistenceError> {
        self.storage.delete(key)
    }

    pub fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        self.storage.keys()
    }

    pub fn save_engine<E: Persistent>(&mut self, engine: &E, now: i64) -> Result<(), PersistenceError> {
        self.save(E::SAVE_KEY, engine, now)
    }

    pub fn load_engine<E: Persistent>(&self) -> Result<Option<E>, PersistenceError> {
        self.load(E::SAVE_KEY)
    }

    pub fn load_engine_or_recover<E: Persistent>(&mut self) -> (Option<E>, Option<LoadWarning>) {
        self.load_or_recover(E::SAVE_KEY)
    }

    /// Collects the stored envelopes of `keys` into one document.
    /// Missing keys are left out; an unreadable one fails the export.
    pub fn export(&self, keys: &[&str], now: i64) -> Result<SaveExport, PersistenceError> {
        let mut export = SaveExport::new(now);
        for &key in keys {
            if let Some(raw) = self.storage.get(key)? {
                export.saves.insert(key.to_string(), SaveEnvelope::parse(raw));
            }
        }
        Ok(export)
    }

    /// Writes every envelope of `export` back under its key, after checking
    /// that none comes from a newer format. Returns the keys written.
    pub fn import(&mut self, export: &SaveExport) -> Result<Vec<String>, PersistenceError> {
        export.validate()?;
        let mut written = Vec::with_capacity(export.saves.len());
        for (key, envelope) in &export.saves {
            self.storage.set(key, serde_json::to_value(envelope)?)?;
            written.push(key.clone());
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        value: u32,
        #[serde(default)]
        label: String,
    }

    impl Persistent for Counter {
        const SAVE_KEY: &'static str = "counter";
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut gateway = PersistenceGateway::in_memory();
        let counter = Counter {
            value: 7,
            label: "kills".to_string(),
        };
        gateway.save_engine(&counter, 1_000).unwrap();

        let loaded: Counter = gateway.load_engine().unwrap().unwrap();
        assert_eq!(loaded, counter);
        assert_eq!(gateway.saved_at("counter").unwrap(), Some(1_000));
    }

    #[test]
    fn test_load_missing_key() {
        let gateway = PersistenceGateway::in_memory();
        assert!(gateway.load_engine::<Counter>().unwrap().is_none());
    }

    #[test]
    fn test_unenveloped_value_loads_as_version_zero() {
        let mut store = MemoryStore::new();
        store.set("counter", json!({"value": 3})).unwrap();
        let gateway = PersistenceGateway::new(Box::new(store));

        let loaded: Counter = gateway.load_engine().unwrap().unwrap();
        assert_eq!(loaded.value, 3);
        assert_eq!(loaded.label, "");
        assert_eq!(gateway.saved_at("counter").unwrap(), None);
    }

    #[test]
    fn test_future_version_rejected() {
        let mut store = MemoryStore::new();
        store
            .set(
                "counter",
                json!({"version": SAVE_FORMAT_VERSION + 1, "saved_at": 0, "data": {"value": 1}}),
            )
            .unwrap();
        let gateway = PersistenceGateway::new(Box::new(store));

        let err = gateway.load_engine::<Counter>().unwrap_err();
        assert!(matches!(err, PersistenceError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_corrupt_data_is_an_error() {
        let mut store = MemoryStore::new();
        store
            .set(
                "counter",
                json!({"version": 1, "saved_at": 0, "data": {"value": "nine"}}),
            )
            .unwrap();
        let gateway = PersistenceGateway::new(Box::new(store));
        assert!(matches!(
            gateway.load_engine::<Counter>(),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn test_recover_moves_bad_value_aside() {
        let mut store = MemoryStore::new();
        store
            .set(
                "counter",
                json!({"version": 1, "saved_at": 0, "data": {"value": "nine"}}),
            )
            .unwrap();
        let mut gateway = PersistenceGateway::new(Box::new(store));

        let (loaded, warning) = gateway.load_engine_or_recover::<Counter>();
        assert!(loaded.is_none());
        let warning = warning.unwrap();
        assert_eq!(warning.key, "counter");
        assert_eq!(warning.preserved_as.as_deref(), Some("counter-corrupt"));
        assert!(!warning.restored_backup);
        assert!(gateway.load_engine::<Counter>().unwrap().is_none());
        assert!(gateway.keys().unwrap().contains(&"counter-corrupt".to_string()));
    }

    #[test]
    fn test_recover_readable_value_has_no_warning() {
        let mut gateway = PersistenceGateway::in_memory();
        gateway.save("counter", &json!({"value": 2}), 5).unwrap();
        let (loaded, warning) = gateway.load_engine_or_recover::<Counter>();
        assert_eq!(loaded.map(|c| c.value), Some(2));
        assert!(warning.is_none());
    }

    #[test]
    fn test_info_reports_version_and_time() {
        let mut store = MemoryStore::new();
        store.set("legacy", json!({"value": 1})).unwrap();
        let mut gateway = PersistenceGateway::new(Box::new(store));
        gateway.save("counter", &json!({"value": 1}), 42).unwrap();

        let info = gateway.info("counter").unwrap().unwrap();
        assert_eq!((info.version, info.saved_at), (SAVE_FORMAT_VERSION, 42));
        assert_eq!(gateway.info("legacy").unwrap().unwrap().version, 0);
        assert!(gateway.info("missing").unwrap().is_none());
    }

    #[test]
    fn test_export_then_import_into_another_store() {
        let mut source = PersistenceGateway::in_memory();
        source.save("a", &1u32, 10).unwrap();
        source.save("b", &2u32, 20).unwrap();
        let export = source.export(&["a", "b", "missing"], 30).unwrap();
        assert_eq!(export.saves.len(), 2);
        assert_eq!(export.exported_at, 30);

        let json = export.to_json().unwrap();
        let parsed = SaveExport::from_json(&json).unwrap();
        let mut target = PersistenceGateway::in_memory();
        assert_eq!(target.import(&parsed).unwrap(), vec!["a", "b"]);
        assert_eq!(target.load::<u32>("b").unwrap(), Some(2));
        assert_eq!(target.saved_at("a").unwrap(), Some(10));
    }

    #[test]
    fn test_import_refuses_newer_envelope_without_writing() {
        let mut export = SaveExport::new(0);
        export.saves.insert(
            "a".to_string(),
            SaveEnvelope {
                version: SAVE_FORMAT_VERSION,
                saved_at: 0,
                data: json!(1),
            },
        );
        export.saves.insert(
            "b".to_string(),
            SaveEnvelope {
                version: SAVE_FORMAT_VERSION + 1,
                saved_at: 0,
                data: json!(2),
            },
        );
        let mut gateway = PersistenceGateway::in_memory();
        let err = gateway.import(&export).unwrap_err();
        assert!(matches!(err, PersistenceError::UnsupportedVersion { .. }));
        assert!(gateway.keys().unwrap().is_empty());
    }

    #[test]
    fn test_delete_and_keys() {
        let mut gateway = PersistenceGateway::in_memory();
        gateway.save("a", &1u32, 0).unwrap();
        gateway.save("b", &2u32, 0).unwrap();
        assert_eq!(gateway.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(gateway.delete("a").unwrap());
        assert!(gateway.load::<u32>("a").unwrap().is_none());
    }
}
