//! Identity-preserving parameter reconciliation.
//!
//! Every re-parse of the URL yields a fresh key/value list. The editor keys
//! its rows by [`ParamId`], so ids must survive re-parses: entries are
//! matched by key, never by position.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::identifiers::ParamId;

// ============================================================================
// ParamEntry
// ============================================================================

/// One query parameter with a stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamEntry {
    /// Identity across edits.
    pub id: ParamId,

    /// Parameter key.
    pub key: String,

    /// Parameter value.
    pub value: String,
}

impl ParamEntry {
    /// Creates an entry with a freshly minted id.
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: ParamId::generate(),
            key: key.into(),
            value: value.into(),
        }
    }
}

// ============================================================================
// Merge
// ============================================================================

/// Reconciles `previous` entries with freshly parsed pairs.
///
/// Output order follows `incoming`. Keys present in `previous` keep their
/// id; new keys get a fresh one; keys absent from `incoming` are dropped.
/// Repeated keys in `incoming` collapse into one entry at the first
/// position carrying the last value.
#[must_use]
pub fn merge_params(previous: &[ParamEntry], incoming: &[(String, String)]) -> Vec<ParamEntry> {
    let known: FxHashMap<&str, ParamId> = previous
        .iter()
        .map(|entry| (entry.key.as_str(), entry.id))
        .collect();

    let mut merged: Vec<ParamEntry> = Vec::with_capacity(incoming.len());
    let mut positions: FxHashMap<&str, usize> = FxHashMap::default();

    for (key, value) in incoming {
        if let Some(&index) = positions.get(key.as_str()) {
            merged[index].value.clone_from(value);
            continue;
        }

        let id = known
            .get(key.as_str())
            .copied()
            .unwrap_or_else(ParamId::generate);

        positions.insert(key.as_str(), merged.len());
        merged.push(ParamEntry {
            id,
            key: key.clone(),
            value: value.clone(),
        });
    }

    merged
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_preserves_id_on_value_change() {
        let a = ParamEntry::new("a", "1");
        let merged = merge_params(std::slice::from_ref(&a), &incoming(&[("a", "2")]));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, a.id);
        assert_eq!(merged[0].key, "a");
        assert_eq!(merged[0].value, "2");
    }

    #[test]
    fn test_drops_stale_keys() {
        let a = ParamEntry::new("a", "1");
        let b = ParamEntry::new("b", "2");
        let merged = merge_params(&[a, b.clone()], &incoming(&[("b", "x")]));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, b.id);
        assert_eq!(merged[0].value, "x");
    }

    #[test]
    fn test_mints_ids_for_new_keys() {
        let a = ParamEntry::new("a", "1");
        let merged = merge_params(std::slice::from_ref(&a), &incoming(&[("a", "1"), ("c", "3")]));

        assert_eq!(merged[0].id, a.id);
        assert_ne!(merged[1].id, a.id);
        assert_eq!(merged[1].key, "c");
    }

    #[test]
    fn test_order_follows_incoming() {
        let a = ParamEntry::new("a", "1");
        let b = ParamEntry::new("b", "2");
        let merged = merge_params(&[a.clone(), b.clone()], &incoming(&[("b", "2"), ("a", "1")]));

        let ids: Vec<_> = merged.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn test_repeated_merge_is_stable() {
        let first = merge_params(&[], &incoming(&[("a", "1"), ("b", "2")]));
        let second = merge_params(&first, &incoming(&[("a", "1"), ("b", "2")]));
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_incoming_keys_collapse() {
        let a = ParamEntry::new("a", "1");
        let merged = merge_params(
            std::slice::from_ref(&a),
            &incoming(&[("a", "1"), ("b", "2"), ("a", "9")]),
        );

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, a.id);
        assert_eq!(merged[0].value, "9");
    }

    #[test]
    fn test_duplicate_previous_keys_last_wins() {
        let first = ParamEntry::new("a", "1");
        let second = ParamEntry::new("a", "2");
        let merged = merge_params(&[first, second.clone()], &incoming(&[("a", "3")]));
        assert_eq!(merged[0].id, second.id);
    }
}
