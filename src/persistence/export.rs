//! Whole-save export documents, for moving a game between machines.

use super::{Persistent, SaveEnvelope};
use crate::core::constants::{SAVE_EXPORT_FORMAT, SAVE_FORMAT_VERSION};
use crate::core::error::PersistenceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every engine envelope of one game, keyed by save key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveExport {
    pub format: String,
    /// Unix milliseconds.
    pub exported_at: i64,
    pub saves: BTreeMap<String, SaveEnvelope>,
}

impl SaveExport {
    pub fn new(now: i64) -> Self {
        Self {
            format: SAVE_EXPORT_FORMAT.to_string(),
            exported_at: now,
            saves: BTreeMap::new(),
        }
    }

    /// Adds `engine` under its save key, stamped with `now`.
    pub fn insert<E: Persistent>(&mut self, engine: &E, now: i64) -> Result<(), PersistenceError> {
        self.saves
            .insert(E::SAVE_KEY.to_string(), SaveEnvelope::wrap(engine, now)?);
        Ok(())
    }

    /// Decodes the engine stored under its key. `Ok(None)` if absent.
    pub fn decode<E: Persistent>(&self) -> Result<Option<E>, PersistenceError> {
        match self.saves.get(E::SAVE_KEY) {
            Some(envelope) => envelope.clone().decode(E::SAVE_KEY).map(Some),
            None => Ok(None),
        }
    }

    /// Rejects foreign documents and envelopes from a newer format.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if self.format != SAVE_EXPORT_FORMAT {
            return Err(PersistenceError::InvalidExport(format!(
                "unknown format '{}'",
                self.format
            )));
        }
        for (key, envelope) in &self.saves {
            if envelope.version > SAVE_FORMAT_VERSION {
                return Err(PersistenceError::UnsupportedVersion {
                    key: key.clone(),
                    found: envelope.version,
                    current: SAVE_FORMAT_VERSION,
                });
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let export: SaveExport = serde_json::from_str(json)?;
        export.validate()?;
        Ok(export)
    }
}
