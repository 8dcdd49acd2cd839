//! Persistent key-value storage.
//!
//! The workbench persists two documents:
//!
//! | Key | Shape |
//! |-----|-------|
//! | [`HOST_DATA_KEY`] | host → [`HostRecord`](crate::history::HostRecord) |
//! | [`REQUEST_CONFIG_KEY`] | environment → scene → `{ "reg": pattern }` |
//!
//! The browser's own storage area sits behind [`KeyValueStore`]; this module
//! ships an in-memory store and a single-file JSON store.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Storage key of the per-host history.
pub const HOST_DATA_KEY: &str = "hostData";

/// Storage key of the capture rule table.
pub const REQUEST_CONFIG_KEY: &str = "requestConfig";

// ============================================================================
// KeyValueStore
// ============================================================================

/// A JSON document store addressed by string keys.
pub trait KeyValueStore: Send + Sync {
    /// Reads a document. `None` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a document, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes a document. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Volatile store, used by tests and as a cache-only backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<FxHashMap<String, Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        trace!(key, "MemoryStore set");
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// Store backed by one JSON object on disk.
///
/// Writes go to a uniquely named temp file in the same directory, which is
/// then persisted over the target.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (or lazily creates) the store at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the backing file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document; a missing file is an empty object.
    fn read_all(&self) -> Result<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        if text.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&text)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::config(format!(
                "Storage file {} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, map: Map<String, Value>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&serde_json::to_vec_pretty(&Value::Object(map))?)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), "Storage file written");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_all()?;
        map.insert(key.to_string(), value);
        self.write_all(map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_all()?;
        if map.remove(key).is_some() {
            self.write_all(map)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").expect("get"), None);

        store.set("k", json!({"a": 1})).expect("set");
        assert_eq!(store.get("k").expect("get"), Some(json!({"a": 1})));

        store.remove("k").expect("remove");
        store.remove("k").expect("remove twice");
        assert_eq!(store.get("k").expect("get"), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        JsonFileStore::new(&path)
            .set(HOST_DATA_KEY, json!({"x.com": {"param": {}, "path": [], "fragment": []}}))
            .expect("set");

        let reopened = JsonFileStore::new(&path);
        let value = reopened.get(HOST_DATA_KEY).expect("get").expect("present");
        assert!(value.get("x.com").is_some());
        assert_eq!(reopened.get(REQUEST_CONFIG_KEY).expect("get"), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get("anything").expect("get"), None);
        store.remove("anything").expect("remove on missing file");
    }

    #[test]
    fn test_file_stores_sharing_a_stem_do_not_collide() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_store = JsonFileStore::new(dir.path().join("state.json"));
        let yaml_store = JsonFileStore::new(dir.path().join("state.yaml"));

        json_store.set("k", json!("json")).expect("set json");
        yaml_store.set("k", json!("yaml")).expect("set yaml");

        assert_eq!(json_store.get("k").expect("get"), Some(json!("json")));
        assert_eq!(yaml_store.get("k").expect("get"), Some(json!("yaml")));

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        names.sort();
        assert_eq!(names, vec!["state.json", "state.yaml"]);
    }

    #[test]
    fn test_file_store_rejects_non_object() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2, 3]").expect("write");

        let err = JsonFileStore::new(&path).get("k").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
