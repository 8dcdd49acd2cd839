//! Host-keyed history store.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::options::HistoryLimits;
use crate::storage::{HOST_DATA_KEY, KeyValueStore};

use super::record::{HostRecord, parse_record, validate_record};

// ============================================================================
// Suggestions
// ============================================================================

/// Autocomplete candidates for one host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestions {
    /// Every remembered parameter key, sorted alphabetically.
    ///
    /// Keys are not kept in first-seen order: the record map is ordered by
    /// key so stored and reloaded records list them identically.
    pub param_keys: Vec<String>,

    /// Recent values of the requested key. Empty unless a known key was
    /// asked for.
    pub param_values: Vec<String>,

    /// Recent paths.
    pub paths: Vec<String>,

    /// Recent fragments.
    pub fragments: Vec<String>,
}

// ============================================================================
// HistoryStore
// ============================================================================

/// Mapping from host to its bounded [`HostRecord`].
///
/// Records are created lazily on the first visit of a non-empty host and
/// only grow through [`record_visit`](Self::record_visit).
///
/// # Example
///
/// ```
/// use url_workbench::HistoryStore;
///
/// let mut store = HistoryStore::new();
/// let params = vec![("a".to_string(), "1".to_string())];
/// store.record_visit("x.com", &params, "/p", "frag");
///
/// let hints = store.suggestions("x.com", Some("a"));
/// assert_eq!(hints.param_values, vec!["1".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    hosts: FxHashMap<String, HostRecord>,
    limits: HistoryLimits,
}

// ============================================================================
// HistoryStore - Constructors
// ============================================================================

impl HistoryStore {
    /// Creates an empty store with default caps.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with custom caps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if any cap is zero.
    pub fn with_limits(limits: HistoryLimits) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            hosts: FxHashMap::default(),
            limits,
        })
    }

    /// Loads the store from the `hostData` document.
    ///
    /// Host entries with an invalid shape are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the caps are invalid or the backing store cannot
    /// be read.
    pub fn load(storage: &dyn KeyValueStore, limits: HistoryLimits) -> Result<Self> {
        let mut store = Self::with_limits(limits)?;

        let Some(Value::Object(hosts)) = storage.get(HOST_DATA_KEY)? else {
            debug!("No stored host data");
            return Ok(store);
        };

        for (host, value) in hosts {
            match validate_record(&value, &store.limits) {
                Ok(record) => {
                    store.hosts.insert(host, record);
                }
                Err(e) => warn!(host = %host, error = %e, "Skipping stored host record"),
            }
        }

        info!(hosts = store.hosts.len(), "History loaded");
        Ok(store)
    }

    /// Writes the store to the `hostData` document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backing store fails.
    pub fn save(&self, storage: &dyn KeyValueStore) -> Result<()> {
        storage.set(HOST_DATA_KEY, serde_json::to_value(&self.hosts)?)?;
        debug!(hosts = self.hosts.len(), "History saved");
        Ok(())
    }
}

// ============================================================================
// HistoryStore - Accessors
// ============================================================================

impl HistoryStore {
    /// Returns the caps in force.
    #[inline]
    #[must_use]
    pub fn limits(&self) -> &HistoryLimits {
        &self.limits
    }

    /// Returns the record of `host`, if any.
    #[inline]
    #[must_use]
    pub fn get(&self, host: &str) -> Option<&HostRecord> {
        self.hosts.get(host)
    }

    /// Returns the number of hosts with a record.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Returns `true` if no host has a record.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Iterates over all hosts with a record.
    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.hosts.keys().map(String::as_str)
    }
}

// ============================================================================
// HistoryStore - Operations
// ============================================================================

impl HistoryStore {
    /// Records one visit of `host`.
    ///
    /// Each non-empty value, the path and the fragment move to the front of
    /// their sequence. Empty keys, values, paths and fragments are ignored.
    /// Returns `true` if anything changed.
    pub fn record_visit(
        &mut self,
        host: &str,
        params: &[(String, String)],
        path: &str,
        fragment: &str,
    ) -> bool {
        if host.is_empty() {
            return false;
        }

        let limits = self.limits;
        let record = self.hosts.entry(host.to_string()).or_default();

        let mut changed = false;
        for (key, value) in params {
            changed |= record.touch_param(key, value, limits.param_values);
        }
        changed |= record.touch_path(path, limits.paths);
        changed |= record.touch_fragment(fragment, limits.fragments);

        if record.is_empty() {
            self.hosts.remove(host);
        }

        debug!(host, changed, "Visit recorded");
        changed
    }

    /// Returns autocomplete candidates for `host`.
    #[must_use]
    pub fn suggestions(&self, host: &str, key: Option<&str>) -> Suggestions {
        let Some(record) = self.hosts.get(host) else {
            return Suggestions::default();
        };

        Suggestions {
            param_keys: record.param.keys().cloned().collect(),
            param_values: key
                .and_then(|k| record.param.get(k))
                .cloned()
                .unwrap_or_default(),
            paths: record.path.clone(),
            fragments: record.fragment.clone(),
        }
    }

    /// Replaces the record of `host` with manually edited JSON.
    ///
    /// Blank text deletes the record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecordShape`](crate::Error::InvalidRecordShape)
    /// and leaves the store untouched if the text is not a valid record.
    pub fn replace_host(&mut self, host: &str, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            self.delete_host(host);
            return Ok(());
        }

        let record = parse_record(text, &self.limits)?;
        self.replace_host_record(host, record);
        Ok(())
    }

    /// Replaces the record of `host` with an already-typed record.
    ///
    /// The record is normalized to the store's caps.
    pub fn replace_host_record(&mut self, host: &str, mut record: HostRecord) {
        record.normalize(&self.limits);
        debug!(host, "Host record replaced");
        self.hosts.insert(host.to_string(), record);
    }

    /// Removes the record of `host`. Returns `true` if one existed.
    pub fn delete_host(&mut self, host: &str) -> bool {
        let removed = self.hosts.remove(host).is_some();
        debug!(host, removed, "Host record deleted");
        removed
    }

    /// Renders the record of `host` as pretty JSON for manual editing.
    ///
    /// A host without a record renders as an empty record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn export_host(&self, host: &str) -> Result<String> {
        let empty = HostRecord::new();
        let record = self.hosts.get(host).unwrap_or(&empty);
        Ok(serde_json::to_string_pretty(record)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Error;
    use crate::storage::MemoryStore;

    fn params(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_record_visit_creates_record() {
        let mut store = HistoryStore::new();
        assert!(store.record_visit("x.com", &params(&[("a", "1"), ("b", "2")]), "/p", "frag"));

        let hints = store.suggestions("x.com", None);
        assert_eq!(hints.param_keys, vec!["a", "b"]);
        assert_eq!(hints.paths, vec!["/p"]);
        assert_eq!(hints.fragments, vec!["frag"]);
        assert!(hints.param_values.is_empty());
    }

    #[test]
    fn test_param_keys_are_alphabetical() {
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &params(&[("zeta", "1"), ("alpha", "2")]), "/", "");
        store.record_visit("x.com", &params(&[("mid", "3")]), "/", "");

        let hints = store.suggestions("x.com", None);
        assert_eq!(hints.param_keys, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_zero_caps_are_rejected() {
        let limits = HistoryLimits::default().with_param_values(0);
        let err = HistoryStore::with_limits(limits).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let err = HistoryStore::load(&MemoryStore::new(), limits).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let store = HistoryStore::with_limits(HistoryLimits::default().with_paths(1)).expect("valid caps");
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_visit_ignores_empty_host() {
        let mut store = HistoryStore::new();
        assert!(!store.record_visit("", &params(&[("a", "1")]), "/p", ""));
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_visit_with_nothing_to_remember_creates_no_record() {
        let mut store = HistoryStore::new();
        assert!(!store.record_visit("x.com", &params(&[("a", "")]), "", ""));
        assert!(store.get("x.com").is_none());
    }

    #[test]
    fn test_bounded_insert_keeps_newest_twenty() {
        let mut store = HistoryStore::new();
        for i in 0..21 {
            store.record_visit("x.com", &params(&[("k", &format!("v{i}"))]), "", "");
        }

        let values = store.suggestions("x.com", Some("k")).param_values;
        assert_eq!(values.len(), 20);
        assert_eq!(values.first().map(String::as_str), Some("v20"));
        assert_eq!(values.last().map(String::as_str), Some("v1"));
    }

    #[test]
    fn test_repeat_of_front_value_is_noop() {
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &params(&[("k", "old")]), "", "");
        store.record_visit("x.com", &params(&[("k", "new")]), "", "");

        assert!(!store.record_visit("x.com", &params(&[("k", "new")]), "", ""));
        assert_eq!(store.suggestions("x.com", Some("k")).param_values, vec!["new", "old"]);
    }

    #[test]
    fn test_repeat_of_older_value_moves_to_front() {
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &params(&[("k", "old")]), "/a", "");
        store.record_visit("x.com", &params(&[("k", "new")]), "/b", "");

        assert!(store.record_visit("x.com", &params(&[("k", "old")]), "/a", ""));
        let hints = store.suggestions("x.com", Some("k"));
        assert_eq!(hints.param_values, vec!["old", "new"]);
        assert_eq!(hints.paths, vec!["/a", "/b"]);
    }

    #[test]
    fn test_path_and_fragment_caps() {
        let mut store = HistoryStore::new();
        for i in 0..12 {
            store.record_visit("x.com", &[], &format!("/p{i}"), &format!("f{i}"));
        }
        let hints = store.suggestions("x.com", None);
        assert_eq!(hints.paths.len(), 10);
        assert_eq!(hints.fragments.len(), 10);
        assert_eq!(hints.paths[0], "/p11");
    }

    #[test]
    fn test_unknown_host_and_key() {
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &params(&[("a", "1")]), "", "");

        assert_eq!(store.suggestions("y.com", Some("a")), Suggestions::default());
        assert!(store.suggestions("x.com", Some("zzz")).param_values.is_empty());
    }

    #[test]
    fn test_replace_host_invalid_leaves_store_untouched() {
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &params(&[("a", "1")]), "/p", "");
        let before = store.get("x.com").cloned();

        let err = store
            .replace_host("x.com", r#"{"param": [], "path": [], "fragment": []}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRecordShape { .. }));
        assert_eq!(store.get("x.com").cloned(), before);
    }

    #[test]
    fn test_replace_host_valid() {
        let mut store = HistoryStore::new();
        store
            .replace_host("x.com", r#"{"param": {"q": ["z"]}, "path": ["/new"], "fragment": ["top"]}"#)
            .expect("valid record");

        let hints = store.suggestions("x.com", Some("q"));
        assert_eq!(hints.param_values, vec!["z"]);
        assert_eq!(hints.paths, vec!["/new"]);
        assert_eq!(hints.fragments, vec!["top"]);
    }

    #[test]
    fn test_replace_host_blank_deletes() {
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &[], "/p", "");
        store.replace_host("x.com", "   ").expect("blank text");
        assert!(store.get("x.com").is_none());
    }

    #[test]
    fn test_delete_missing_host_is_noop() {
        let mut store = HistoryStore::new();
        assert!(!store.delete_host("nowhere.com"));
    }

    #[test]
    fn test_export_then_replace_is_identity() {
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &params(&[("a", "1")]), "/p", "f");
        let before = store.get("x.com").cloned();

        let text = store.export_host("x.com").expect("export");
        store.replace_host("x.com", &text).expect("re-import");
        assert_eq!(store.get("x.com").cloned(), before);

        let empty = store.export_host("y.com").expect("export empty");
        assert!(empty.contains("\"param\""));
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStore::new();
        let mut store = HistoryStore::new();
        store.record_visit("x.com", &params(&[("a", "1")]), "/p", "f");
        store.save(&storage).expect("save");

        let loaded = HistoryStore::load(&storage, HistoryLimits::default()).expect("load");
        assert_eq!(loaded.get("x.com"), store.get("x.com"));
    }

    #[test]
    fn test_load_skips_invalid_hosts() {
        let storage = MemoryStore::new();
        storage
            .set(
                HOST_DATA_KEY,
                serde_json::json!({
                    "good.com": {"param": {}, "path": ["/"], "fragment": []},
                    "bad.com": {"param": 1}
                }),
            )
            .expect("set");

        let loaded = HistoryStore::load(&storage, HistoryLimits::default()).expect("load");
        assert_eq!(loaded.len(), 1);
        assert!(loaded.get("good.com").is_some());
    }
}
