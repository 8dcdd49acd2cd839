//! Per-host history record and its validation.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::options::HistoryLimits;

// ============================================================================
// HostRecord
// ============================================================================

/// Remembered parameter values, paths and fragments of one host.
///
/// Every sequence is most-recent first, duplicate free and capped by
/// [`HistoryLimits`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Parameter key → recent values, keys in alphabetical order.
    pub param: BTreeMap<String, Vec<String>>,

    /// Recent paths.
    pub path: Vec<String>,

    /// Recent fragments.
    pub fragment: Vec<String>,
}

impl HostRecord {
    /// Creates an empty record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.param.is_empty() && self.path.is_empty() && self.fragment.is_empty()
    }

    /// Records one value for `key`. Returns `true` if the record changed.
    pub fn touch_param(&mut self, key: &str, value: &str, cap: usize) -> bool {
        if key.is_empty() || value.is_empty() {
            return false;
        }
        let values = self.param.entry(key.to_string()).or_default();
        touch_front(values, value, cap)
    }

    /// Records a path. Returns `true` if the record changed.
    pub fn touch_path(&mut self, path: &str, cap: usize) -> bool {
        !path.is_empty() && touch_front(&mut self.path, path, cap)
    }

    /// Records a fragment. Returns `true` if the record changed.
    pub fn touch_fragment(&mut self, fragment: &str, cap: usize) -> bool {
        !fragment.is_empty() && touch_front(&mut self.fragment, fragment, cap)
    }

    /// Removes duplicates (first occurrence wins) and truncates to the caps.
    pub fn normalize(&mut self, limits: &HistoryLimits) {
        for values in self.param.values_mut() {
            dedup_truncate(values, limits.param_values);
        }
        dedup_truncate(&mut self.path, limits.paths);
        dedup_truncate(&mut self.fragment, limits.fragments);
    }
}

// ============================================================================
// Bounded Insert
// ============================================================================

/// Moves `item` to the front of `seq`, inserting it if absent.
///
/// - already at the front: no change
/// - present further back: moved to the front
/// - absent: prepended, tail truncated to `cap`
///
/// Returns `true` if `seq` changed.
pub fn touch_front(seq: &mut Vec<String>, item: &str, cap: usize) -> bool {
    match seq.iter().position(|existing| existing == item) {
        Some(0) => false,
        Some(index) => {
            let existing = seq.remove(index);
            seq.insert(0, existing);
            true
        }
        None => {
            seq.insert(0, item.to_string());
            seq.truncate(cap);
            true
        }
    }
}

fn dedup_truncate(seq: &mut Vec<String>, cap: usize) {
    let mut seen = rustc_hash::FxHashSet::default();
    seq.retain(|item| seen.insert(item.clone()));
    seq.truncate(cap);
}

// ============================================================================
// Validation
// ============================================================================

/// Parses manually edited JSON text into a record.
///
/// # Errors
///
/// Returns [`Error::InvalidRecordShape`] for JSON syntax errors and for any
/// shape violation. No partially valid record is ever produced.
pub fn parse_record(text: &str, limits: &HistoryLimits) -> Result<HostRecord> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::invalid_record_shape(format!("JSON syntax error: {e}")))?;
    validate_record(&value, limits)
}

/// Validates a JSON value and converts it into a normalized record.
///
/// Unknown extra fields are ignored.
///
/// # Errors
///
/// Returns [`Error::InvalidRecordShape`] naming the first offending field.
pub fn validate_record(value: &Value, limits: &HistoryLimits) -> Result<HostRecord> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::invalid_record_shape("record must be a JSON object"))?;

    let (Some(param), Some(path), Some(fragment)) = (
        object.get("param").and_then(Value::as_object),
        object.get("path").and_then(Value::as_array),
        object.get("fragment").and_then(Value::as_array),
    ) else {
        return Err(Error::invalid_record_shape(
            "record must contain param (object), path (array) and fragment (array)",
        ));
    };

    let mut record = HostRecord::new();

    for (key, values) in param {
        let values = values
            .as_array()
            .ok_or_else(|| Error::invalid_record_shape(format!("param.{key} must be an array")))?;
        record
            .param
            .insert(key.clone(), string_items(values, &format!("param.{key}"))?);
    }
    record.path = string_items(path, "path")?;
    record.fragment = string_items(fragment, "fragment")?;

    record.normalize(limits);
    Ok(record)
}

fn string_items(items: &[Value], field: &str) -> Result<Vec<String>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                Error::invalid_record_shape(format!("{field}[{index}] must be a string"))
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_touch_front_prepends_and_caps() {
        let mut seq = Vec::new();
        for i in 0..21 {
            assert!(touch_front(&mut seq, &format!("v{i}"), 20));
        }
        assert_eq!(seq.len(), 20);
        assert_eq!(seq[0], "v20");
        assert_eq!(seq[19], "v1");
        assert!(!seq.contains(&"v0".to_string()));
    }

    #[test]
    fn test_touch_front_value_at_front_is_noop() {
        let mut seq = strings(&["a", "b", "c"]);
        assert!(!touch_front(&mut seq, "a", 20));
        assert_eq!(seq, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_touch_front_moves_existing_value() {
        let mut seq = strings(&["a", "b", "c"]);
        assert!(touch_front(&mut seq, "c", 20));
        assert_eq!(seq, strings(&["c", "a", "b"]));
    }

    #[test]
    fn test_touch_ignores_empty_input() {
        let mut record = HostRecord::new();
        assert!(!record.touch_param("", "1", 20));
        assert!(!record.touch_param("a", "", 20));
        assert!(!record.touch_path("", 10));
        assert!(!record.touch_fragment("", 10));
        assert!(record.is_empty());
    }

    #[test]
    fn test_validate_accepts_good_shape() {
        let value = json!({
            "param": {"a": ["1", "2"]},
            "path": ["/p"],
            "fragment": [],
            "extra": true
        });
        let record = validate_record(&value, &HistoryLimits::default()).expect("valid");
        assert_eq!(record.param["a"], strings(&["1", "2"]));
        assert_eq!(record.path, strings(&["/p"]));
    }

    #[test]
    fn test_validate_rejects_missing_field() {
        let value = json!({"param": {}, "path": []});
        let err = validate_record(&value, &HistoryLimits::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidRecordShape { .. }));
    }

    #[test]
    fn test_validate_rejects_non_array_param() {
        let value = json!({"param": {"a": "1"}, "path": [], "fragment": []});
        let err = validate_record(&value, &HistoryLimits::default()).unwrap_err();
        assert!(err.to_string().contains("param.a must be an array"));
    }

    #[test]
    fn test_validate_rejects_non_string_item() {
        let value = json!({"param": {}, "path": ["/ok", 3], "fragment": []});
        let err = validate_record(&value, &HistoryLimits::default()).unwrap_err();
        assert!(err.to_string().contains("path[1] must be a string"));
    }

    #[test]
    fn test_parse_record_reports_syntax_errors() {
        let err = parse_record("{ not json", &HistoryLimits::default()).unwrap_err();
        assert!(err.to_string().contains("JSON syntax error"));
    }

    #[test]
    fn test_validate_normalizes() {
        let limits = HistoryLimits::new().with_paths(2);
        let value = json!({
            "param": {"a": ["1", "1", "2"]},
            "path": ["/a", "/a", "/b", "/c"],
            "fragment": []
        });
        let record = validate_record(&value, &limits).expect("valid");
        assert_eq!(record.param["a"], strings(&["1", "2"]));
        assert_eq!(record.path, strings(&["/a", "/b"]));
    }
}
