//! Stateful URL editing model.
//!
//! Holds one current URL plus its derived fields and keeps them in sync:
//!
//! - [`load`](UrlStateModel::load) re-derives every field from a raw URL
//! - field and parameter edits change one field, then re-encode the URL
//! - [`commit`](UrlStateModel::commit) records the current state in a
//!   [`HistoryStore`]; edits never commit on their own
//!
//! An edit that cannot be encoded is rolled back and reported as `false`.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::Result;
use crate::history::{HistoryStore, Suggestions};
use crate::identifiers::ParamId;

use super::codec::{self, ParsedUrl};
use super::merge::{ParamEntry, merge_params};

// ============================================================================
// UrlField
// ============================================================================

/// Directly editable URL fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlField {
    /// Host, optionally with `:port`.
    Host,
    /// Path.
    Path,
    /// Fragment without `#`.
    Fragment,
}

// ============================================================================
// UrlStateModel
// ============================================================================

/// The current URL and its derived, editable fields.
///
/// # Example
///
/// ```
/// use url_workbench::{HistoryStore, UrlField, UrlStateModel};
///
/// let mut model = UrlStateModel::new();
/// model.load("https://x.com/p?a=1").unwrap();
/// assert!(model.edit_field(UrlField::Path, "/q"));
/// assert_eq!(model.url(), "https://x.com/q?a=1");
///
/// let mut history = HistoryStore::new();
/// model.commit(&mut history);
/// assert_eq!(history.suggestions("x.com", None).paths, vec!["/q".to_string()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct UrlStateModel {
    url: String,
    scheme: String,
    host: String,
    path: String,
    fragment: String,
    params: Vec<ParamEntry>,
    focused_key: Option<String>,
    added: u32,
}

// ============================================================================
// UrlStateModel - Accessors
// ============================================================================

impl UrlStateModel {
    /// Creates an empty model.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current URL string.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the scheme.
    #[inline]
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns the host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the fragment.
    #[inline]
    #[must_use]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Returns the parameter entries in URL order.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamEntry] {
        &self.params
    }

    /// Looks up a parameter entry by id.
    #[must_use]
    pub fn param(&self, id: ParamId) -> Option<&ParamEntry> {
        self.params.iter().find(|entry| entry.id == id)
    }

    /// Returns the key whose value suggestions are shown.
    #[inline]
    #[must_use]
    pub fn focused_key(&self) -> Option<&str> {
        self.focused_key.as_deref()
    }

    /// Returns `true` until a URL has been loaded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }

    /// Returns the parameters as unique key/value pairs.
    ///
    /// Entries with an empty key are left out. When two entries share a
    /// key the first keeps its position and the last supplies the value.
    #[must_use]
    pub fn param_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::with_capacity(self.params.len());
        let mut positions: FxHashMap<&str, usize> = FxHashMap::default();

        for entry in self.params.iter().filter(|e| !e.key.is_empty()) {
            match positions.get(entry.key.as_str()) {
                Some(&index) => pairs[index].1.clone_from(&entry.value),
                None => {
                    positions.insert(entry.key.as_str(), pairs.len());
                    pairs.push((entry.key.clone(), entry.value.clone()));
                }
            }
        }

        pairs
    }

    /// Returns the derived fields as a [`ParsedUrl`].
    #[must_use]
    pub fn to_parsed(&self) -> ParsedUrl {
        ParsedUrl {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            path: self.path.clone(),
            fragment: self.fragment.clone(),
            params: self.param_pairs(),
        }
    }
}

// ============================================================================
// UrlStateModel - Load & Commit
// ============================================================================

impl UrlStateModel {
    /// Loads a raw URL, re-deriving every field.
    ///
    /// Parameter ids survive for keys that were already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedUrl`](crate::Error::MalformedUrl) with the
    /// model left unchanged if `raw` does not parse.
    pub fn load(&mut self, raw: &str) -> Result<()> {
        let parsed = codec::decode(raw)?;

        self.params = merge_params(&self.params, &parsed.params);
        self.url = raw.to_string();
        self.scheme = parsed.scheme;
        self.host = parsed.host;
        self.path = parsed.path;
        self.fragment = parsed.fragment;

        if self.focused_key.is_none() {
            self.focused_key = self.params.first().map(|entry| entry.key.clone());
        }

        debug!(host = %self.host, params = self.params.len(), "URL loaded");
        Ok(())
    }

    /// Records the host, params, path and fragment of the current URL.
    ///
    /// Fields are re-read from [`url`](Self::url), so an edited `a b` path
    /// is recorded as `/a%20b` and `X.COM` as `x.com`, exactly as a later
    /// [`load`](Self::load) of the same URL would see them.
    ///
    /// One call records at most one visit. Returns `true` if the history
    /// changed.
    pub fn commit(&self, history: &mut HistoryStore) -> bool {
        match codec::decode(&self.url) {
            Ok(parsed) => {
                history.record_visit(&parsed.host, &parsed.params, &parsed.path, &parsed.fragment)
            }
            Err(_) => false,
        }
    }

    /// Returns suggestions for the current host and focused key.
    #[must_use]
    pub fn suggestions(&self, history: &HistoryStore) -> Suggestions {
        let host = codec::decode(&self.url).map_or_else(|_| self.host.clone(), |parsed| parsed.host);
        history.suggestions(&host, self.focused_key())
    }

    /// Sets the key whose value suggestions are shown.
    pub fn focus_key(&mut self, key: impl Into<String>) {
        self.focused_key = Some(key.into());
    }
}

// ============================================================================
// UrlStateModel - Edits
// ============================================================================

impl UrlStateModel {
    /// Replaces one field and re-encodes the URL.
    ///
    /// Returns `false` with the field restored if the result does not
    /// encode.
    pub fn edit_field(&mut self, field: UrlField, value: &str) -> bool {
        let slot = match field {
            UrlField::Host => &mut self.host,
            UrlField::Path => &mut self.path,
            UrlField::Fragment => &mut self.fragment,
        };
        let previous = std::mem::replace(slot, value.to_string());

        if self.sync_url() {
            return true;
        }

        match field {
            UrlField::Host => self.host = previous,
            UrlField::Path => self.path = previous,
            UrlField::Fragment => self.fragment = previous,
        }
        false
    }

    /// Appends a placeholder parameter `newParamN=valueN`.
    ///
    /// Returns the new id, or `None` if the URL could not be re-encoded.
    pub fn add_param(&mut self) -> Option<ParamId> {
        self.added += 1;
        let n = self.added;
        self.add_param_with(format!("newParam{n}"), format!("value{n}"))
    }

    /// Appends a parameter with the given key and value.
    pub fn add_param_with(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<ParamId> {
        let entry = ParamEntry::new(key, value);
        let id = entry.id;
        self.edit_params(|params| {
            params.push(entry);
            true
        })
        .then_some(id)
    }

    /// Removes the parameter with `id`. Returns `false` if absent.
    pub fn remove_param(&mut self, id: ParamId) -> bool {
        self.edit_params(|params| {
            let before = params.len();
            params.retain(|entry| entry.id != id);
            params.len() != before
        })
    }

    /// Renames the key of parameter `id`, keeping its identity.
    ///
    /// A blank key or an unchanged key is a no-op and returns `false`.
    pub fn rename_param_key(&mut self, id: ParamId, new_key: &str) -> bool {
        if new_key.trim().is_empty() {
            return false;
        }

        let renamed = self.edit_params(|params| {
            match params.iter_mut().find(|entry| entry.id == id) {
                Some(entry) if entry.key != new_key => {
                    entry.key = new_key.to_string();
                    true
                }
                _ => false,
            }
        });

        if renamed {
            self.focused_key = Some(new_key.to_string());
        }
        renamed
    }

    /// Sets the value of parameter `id`. Returns `false` if absent.
    pub fn set_param_value(&mut self, id: ParamId, value: &str) -> bool {
        self.edit_params(|params| match params.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.value = value.to_string();
                true
            }
            None => false,
        })
    }
}

// ============================================================================
// UrlStateModel - Internal
// ============================================================================

impl UrlStateModel {
    /// Applies `edit` to the parameter list and re-encodes.
    ///
    /// `edit` returns whether it changed anything; the list is restored if
    /// the URL does not encode afterwards.
    fn edit_params<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut Vec<ParamEntry>) -> bool,
    {
        let snapshot = self.params.clone();
        if !edit(&mut self.params) {
            return false;
        }
        if self.sync_url() {
            return true;
        }
        self.params = snapshot;
        false
    }

    /// Re-encodes the derived fields into `url`.
    fn sync_url(&mut self) -> bool {
        match codec::encode(&self.to_parsed()) {
            Ok(url) => {
                self.url = url;
                true
            }
            Err(e) => {
                debug!(error = %e, "Edit rejected");
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
