//! Runtime settings read from `config.json` in the save directory.

use crate::core::constants::{CONFIG_FILE_NAME, DAILY_QUEST_COUNT, DEFAULT_INVENTORY_CAPACITY};
use crate::persistence::{default_save_dir, load_json_or_default};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Overrides the platform data directory.
    pub save_dir: Option<PathBuf>,
    /// Fixed seed for reproducible sessions; entropy when absent.
    pub rng_seed: Option<u64>,
    pub inventory_capacity: usize,
    pub daily_quest_count: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            save_dir: None,
            rng_seed: None,
            inventory_capacity: DEFAULT_INVENTORY_CAPACITY,
            daily_quest_count: DAILY_QUEST_COUNT,
        }
    }
}

impl GameConfig {
    /// Reads `config.json` from `dir`, falling back to defaults when the
    /// file is missing or invalid.
    pub fn load_from(dir: &Path) -> Self {
        load_json_or_default(&dir.join(CONFIG_FILE_NAME))
    }

    /// Reads the config from the platform data directory.
    pub fn load() -> Self {
        match default_save_dir() {
            Ok(dir) => Self::load_from(&dir),
            Err(e) => {
                tracing::warn!(error = %e, "no data directory, using default config");
                Self::default()
            }
        }
    }

    pub fn resolve_save_dir(&self) -> io::Result<PathBuf> {
        match &self.save_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_save_dir(),
        }
    }
}
