//! JSON-file store backend.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::port::SessionStore;

/// Desktop store backend keeping all keys in one pretty-printed JSON file.
///
/// The file is read once at open; a missing or unreadable file starts an
/// empty store rather than failing.
#[derive(Debug)]
pub struct JsonFileStore {
    entries: Mutex<HashMap<String, String>>,
    file_path: PathBuf,
}

impl JsonFileStore {
    pub fn open(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let entries = match fs::read_to_string(&file_path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => HashMap::new(),
        };

        Self {
            entries: Mutex::new(entries),
            file_path,
        }
    }

    fn flush(&self, entries: &HashMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.file_path, json)?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        entries.remove(key);
        self.flush(&entries)
    }
}
