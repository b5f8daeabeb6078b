//! JSON file key-value store
//!
//! All entries live in one `storage.json` object inside the Sendo directory.
//! Writers take an exclusive `fs2` lock on a sibling `.lock` file and replace
//! the data file through a rename, so a crash never leaves half a file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStore;

pub const STORAGE_FILE: &str = "storage.json";

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(sendo_dir: &Path) -> Self {
        Self {
            path: sendo_dir.join(STORAGE_FILE),
            lock_path: sendo_dir.join(format!("{}.lock", STORAGE_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self, exclusive: bool) -> Result<File> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        if exclusive {
            FileExt::lock_exclusive(&file)?;
        } else {
            FileExt::lock_shared(&file)?;
        }
        Ok(file)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::storage(format!("{} is corrupted: {}", self.path.display(), e))
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let lock = self.lock(true)?;
        let result = self.read_all().and_then(|mut entries| {
            if change(&mut entries) {
                self.write_all(&entries)
            } else {
                Ok(())
            }
        });
        let _ = FileExt::unlock(&lock);
        result
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let lock = self.lock(false)?;
        let result = self.read_all().map(|mut entries| entries.remove(key));
        let _ = FileExt::unlock(&lock);
        result
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert_eq!(store.get("login-sendo").unwrap(), None);
        store.set("login-sendo", r#"{"accessToken":"abc"}"#).unwrap();
        store.set("user-info", "{}").unwrap();
        assert_eq!(
            store.get("login-sendo").unwrap().as_deref(),
            Some(r#"{"accessToken":"abc"}"#)
        );

        store.remove("login-sendo").unwrap();
        store.remove("login-sendo").unwrap();
        assert_eq!(store.get("login-sendo").unwrap(), None);
        assert_eq!(store.get("user-info").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        JsonFileStore::new(dir.path()).set("k", "v").unwrap();
        assert_eq!(JsonFileStore::new(dir.path()).get("k").unwrap().as_deref(), Some("v"));
        assert!(!dir.path().join("storage.json.tmp").exists());
    }

    #[test]
    fn test_corrupted_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STORAGE_FILE), "not json").unwrap();
        let err = JsonFileStore::new(dir.path()).get("k").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
