//! JSON file storage with checksums, one file per key.
//!
//! File format:
//! - First line: `sha256:<hex digest of the payload bytes>`
//! - Remaining bytes: pretty-printed JSON payload
//!
//! Writes go to a temporary file that is renamed over the target, so a crash
//! mid-write leaves the previous save intact. Before each overwrite the
//! current file is copied to `backups/<key>.1.json`, shifting older copies up
//! to the configured count. Unreadable files are moved to `corrupt/`.

use super::storage::Storage;
use crate::core::constants::SAVE_BACKUP_COUNT;
use crate::core::error::PersistenceError;
use directories::ProjectDirs;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const CHECKSUM_PREFIX: &str = "sha256:";
const FILE_EXTENSION: &str = "json";
const BACKUP_DIR: &str = "backups";
const CORRUPT_DIR: &str = "corrupt";

pub struct FileStore {
    dir: PathBuf,
    backup_count: usize,
}

impl FileStore {
    /// Opens the store in the platform data directory.
    pub fn new() -> io::Result<Self> {
        Self::at(default_save_dir()?)
    }

    /// Opens the store in `dir`, creating it if needed.
    pub fn at(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            backup_count: SAVE_BACKUP_COUNT,
        })
    }

    /// Keeps `count` older copies per key. Zero disables backups.
    pub fn with_backups(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.{}", key, FILE_EXTENSION)))
    }

    fn backup_path(&self, key: &str, n: usize) -> PathBuf {
        self.dir
            .join(BACKUP_DIR)
            .join(format!("{}.{}.{}", key, n, FILE_EXTENSION))
    }

    /// Shifts `key.1 .. key.(n-1)` up by one and copies the live file to `key.1`.
    fn rotate_backups(&self, key: &str, live: &Path) -> Result<(), PersistenceError> {
        if self.backup_count == 0 || !live.exists() {
            return Ok(());
        }
        fs::create_dir_all(self.dir.join(BACKUP_DIR))?;
        remove_if_present(&self.backup_path(key, self.backup_count))?;
        for n in (1..self.backup_count).rev() {
            let from = self.backup_path(key, n);
            if from.exists() {
                fs::rename(&from, self.backup_path(key, n + 1))?;
            }
        }
        fs::copy(live, self.backup_path(key, 1))?;
        Ok(())
    }
}

/// The platform data directory for save files.
pub fn default_save_dir() -> io::Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "shadow-monarch").ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine data directory",
        )
    })?;
    Ok(project_dirs.data_dir().to_path_buf())
}

/// Accepts keys made of ASCII letters, digits, `-` and `_`, so every key
/// maps to exactly one file name and back.
pub fn validate_key(key: &str) -> Result<(), PersistenceError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}

fn checksum_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Reads and verifies one checksummed file. `Ok(None)` if it does not exist.
fn read_checked(path: &Path, key: &str) -> Result<Option<Value>, PersistenceError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let (header, payload) = contents
        .split_once('\n')
        .ok_or_else(|| PersistenceError::Checksum(key.to_string()))?;
    let stored = header
        .strip_prefix(CHECKSUM_PREFIX)
        .ok_or_else(|| PersistenceError::Checksum(key.to_string()))?;

    if stored != checksum_hex(payload.as_bytes()) {
        return Err(PersistenceError::Checksum(key.to_string()));
    }

    Ok(Some(serde_json::from_str(payload)?))
}

fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

impl Storage for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        read_checked(&self.path_for(key)?, key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let payload = serde_json::to_string_pretty(&value)?;
        let contents = format!(
            "{}{}\n{}",
            CHECKSUM_PREFIX,
            checksum_hex(payload.as_bytes()),
            payload
        );

        let tmp_path = path.with_extension(format!("{}.tmp", FILE_EXTENSION));
        fs::write(&tmp_path, contents)?;
        self.rotate_backups(key, &path)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Removes the live file and every backup of `key`.
    fn delete(&mut self, key: &str) -> Result<bool, PersistenceError> {
        let existed = remove_if_present(&self.path_for(key)?)?;
        for n in 1..=self.backup_count {
            remove_if_present(&self.backup_path(key, n))?;
        }
        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Moves the raw file, unread, to `corrupt/<key>.json`.
    fn quarantine(&mut self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let corrupt_dir = self.dir.join(CORRUPT_DIR);
        fs::create_dir_all(&corrupt_dir)?;
        let target = corrupt_dir.join(format!("{}.{}", key, FILE_EXTENSION));
        fs::rename(&path, &target)?;
        Ok(Some(target.display().to_string()))
    }

    fn backups(&self, key: &str) -> Result<Vec<Value>, PersistenceError> {
        validate_key(key)?;
        let mut values = Vec::new();
        for n in 1..=self.backup_count {
            match read_checked(&self.backup_path(key, n), key) {
                Ok(Some(value)) => values.push(value),
                Ok(None) => {}
                Err(e) => tracing::debug!(key, backup = n, error = %e, "skipping unreadable backup"),
            }
        }
        Ok(values)
    }
}

/// Load a JSON file, returning `T::default()` if missing or invalid.
pub fn load_json_or_default<T: Default + serde::de::DeserializeOwned>(path: &Path) -> T {
    match fs::read_to_string(path) {
        Ok(json) => serde_json::from_str(&json).unwrap_or_default(),
        Err(_) => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Creates a FileStore in a unique temporary directory.
    fn test_store() -> FileStore {
        use std::sync::atomic::{AtomicU64, Ordering};
        static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

        let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "shadow-monarch-store-{}-{}",
            std::process::id(),
            test_id
        ));
        let _ = fs::remove_dir_all(&dir);
        FileStore::at(dir).expect("Failed to create FileStore")
    }

    #[test]
    fn test_set_and_get() {
        let mut store = test_store();
        let value = json!({"level": 12, "rank": "D"});
        store.set("progression", value.clone()).unwrap();

        assert_eq!(store.get("progression").unwrap(), Some(value));
        assert_eq!(store.keys().unwrap(), vec!["progression".to_string()]);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = test_store();
        assert!(store.get("nothing").unwrap().is_none());
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_tampered_file_fails_checksum() {
        let mut store = test_store();
        store.set("inventory", json!({"gold": 10})).unwrap();

        let path = store.path_for("inventory").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        fs::write(&path, contents.replace("10", "99999")).unwrap();

        let err = store.get("inventory").unwrap_err();
        assert!(matches!(err, PersistenceError::Checksum(_)));
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let mut store = test_store();
        store.set("army", json!([])).unwrap();
        let leftovers = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_delete_removes_backups() {
        let mut store = test_store();
        store.set("quests", json!({"n": 1})).unwrap();
        store.set("quests", json!({"n": 2})).unwrap();
        assert_eq!(store.backups("quests").unwrap().len(), 1);

        assert!(store.delete("quests").unwrap());
        assert!(!store.delete("quests").unwrap());
        assert!(store.get("quests").unwrap().is_none());
        assert!(store.backups("quests").unwrap().is_empty());
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_keys_that_would_collide_are_rejected() {
        let mut store = test_store();
        store.set("slot_1", json!(1)).unwrap();
        for key in ["slot.1", "../etc/passwd", " slot 1 ", ""] {
            let err = store.set(key, json!(2)).unwrap_err();
            assert!(matches!(err, PersistenceError::InvalidKey(_)), "{:?}", key);
            assert!(store.get(key).is_err());
        }
        assert_eq!(store.get("slot_1").unwrap(), Some(json!(1)));
        assert_eq!(store.keys().unwrap(), vec!["slot_1".to_string()]);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_backups_rotate_and_stay_bounded() {
        let mut store = test_store().with_backups(3);
        for n in 1..=6 {
            store.set("army", json!({"n": n})).unwrap();
        }

        assert_eq!(store.get("army").unwrap(), Some(json!({"n": 6})));
        assert_eq!(
            store.backups("army").unwrap(),
            vec![json!({"n": 5}), json!({"n": 4}), json!({"n": 3})]
        );
        assert!(!store.backup_path("army", 4).exists());
        // Backups never show up as keys.
        assert_eq!(store.keys().unwrap(), vec!["army".to_string()]);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_tampered_backup_is_skipped() {
        let mut store = test_store();
        for n in 1..=3 {
            store.set("army", json!({"n": n})).unwrap();
        }
        let newest = store.backup_path("army", 1);
        let contents = fs::read_to_string(&newest).unwrap();
        fs::write(&newest, contents.replace('2', "7")).unwrap();

        assert_eq!(store.backups("army").unwrap(), vec![json!({"n": 1})]);
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_quarantine_keeps_raw_bytes() {
        let mut store = test_store();
        store.set("quests", json!({"active": []})).unwrap();
        let path = store.path_for("quests").unwrap();
        fs::write(&path, "not a save").unwrap();

        let moved = store.quarantine("quests").unwrap().unwrap();
        assert!(!path.exists());
        assert_eq!(fs::read_to_string(&moved).unwrap(), "not a save");
        assert!(store.get("quests").unwrap().is_none());
        assert!(store.quarantine("quests").unwrap().is_none());
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_without_backups_nothing_is_copied() {
        let mut store = test_store().with_backups(0);
        store.set("army", json!(1)).unwrap();
        store.set("army", json!(2)).unwrap();
        assert!(store.backups("army").unwrap().is_empty());
        assert!(!store.dir().join(BACKUP_DIR).exists());
        fs::remove_dir_all(store.dir()).ok();
    }

    #[test]
    fn test_load_json_or_default_missing() {
        let val: Vec<String> =
            load_json_or_default(Path::new("/nonexistent/shadow-monarch/config.json"));
        assert!(val.is_empty());
    }
}
