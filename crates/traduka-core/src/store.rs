//! Client-side key/value stores backing the persisted cache tier
//!
//! Two stores exist per coordinator: a per-session store holding translated
//! strings under a fixed prefix, and a durable preference store remembering
//! the last explicitly chosen language. Both are best-effort collaborators;
//! the coordinator swallows their failures and keeps serving from the
//! in-process tier.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use traduka_common::{Result, TradukaError};
use tracing::debug;

/// String key/value storage with bulk removal by key prefix.
pub trait ClientStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every entry whose key starts with `prefix`.
    fn remove_prefix(&self, prefix: &str) -> Result<()>;
}

/// Volatile in-memory store.
///
/// The default session and preference store; also what tests use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ClientStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_prefix(&self, prefix: &str) -> Result<()> {
        self.entries
            .write()
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

/// JSON-file-backed store, write-through on every mutation.
///
/// Stands in for the browser's session storage: entries survive re-creating
/// the coordinator as long as the backing file does.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store at `path`, loading existing entries if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Starting with an empty store at {:?}: {}", path, e);
                HashMap::new()
            }
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    fn load(path: &Path) -> Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(path)?;
        let entries = serde_json::from_str(&content)?;
        Ok(entries)
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)
            .map_err(|e| TradukaError::store_with_source("Failed to write store file", e))?;
        Ok(())
    }
}

impl ClientStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove_prefix(&self, prefix: &str) -> Result<()> {
        let mut entries = self.entries.write();
        entries.retain(|key, _| !key.starts_with(prefix));
        self.save(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.put("greeting_en", "welcome").unwrap();
        assert_eq!(store.get("greeting_en").unwrap().as_deref(), Some("welcome"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_prefix_removal() {
        let store = MemoryStore::new();
        store.put("cache::hola_en", "hello").unwrap();
        store.put("cache::adios_en", "goodbye").unwrap();
        store.put("pref::language", "en").unwrap();

        store.remove_prefix("cache::").unwrap();

        assert!(store.get("cache::hola_en").unwrap().is_none());
        assert!(store.get("cache::adios_en").unwrap().is_none());
        assert_eq!(store.get("pref::language").unwrap().as_deref(), Some("en"));
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.put("cache::hola_en", "hello").unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("cache::hola_en").unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_file_store_prefix_removal_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.put("cache::hola_en", "hello").unwrap();
        store.put("other", "kept").unwrap();
        store.remove_prefix("cache::").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert!(reopened.get("cache::hola_en").unwrap().is_none());
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("kept"));
    }

    #[test]
    fn test_file_store_tolerates_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.get("anything").unwrap().is_none());
    }
}
