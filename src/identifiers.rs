//! Type-safe identifiers.
//!
//! Newtype wrappers keep tab IDs, request IDs, parameter IDs and port IDs
//! from being mixed up at compile time.
//!
//! | Type | Backing | Source |
//! |------|---------|--------|
//! | [`TabId`] | `NonZeroU32` | Browser |
//! | [`RequestId`] | UUID v4 | Generated per request |
//! | [`ParamId`] | UUID v4 | Generated per new query parameter |
//! | [`InterceptId`] | `String` | Returned by the interceptor |
//! | [`PortId`] | `u64` counter | Generated per port connection |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// TabId
// ============================================================================

/// Browser tab identifier.
///
/// Browsers never hand out tab `0`, so the zero value is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(NonZeroU32);

impl TabId {
    /// Creates a tab ID, returning `None` for zero.
    #[inline]
    #[must_use]
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Correlates a request with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh request ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ParamId
// ============================================================================

/// Stable identity of one query parameter across edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamId(Uuid);

impl ParamId {
    /// Mints a fresh parameter ID.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// InterceptId
// ============================================================================

/// Handle of an installed request interception.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterceptId(String);

impl InterceptId {
    /// Wraps an interceptor-provided handle.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the handle as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PortId
// ============================================================================

/// Next port ID. Starts at 1.
static NEXT_PORT_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one duplex port connection to the background hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(u64);

impl PortId {
    /// Allocates the next port ID.
    #[inline]
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_PORT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "port-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_id_rejects_zero() {
        assert!(TabId::new(0).is_none());
        assert_eq!(TabId::new(7).map(|t| t.as_u32()), Some(7));
    }

    #[test]
    fn test_tab_id_serializes_as_number() {
        let tab = TabId::new(42).expect("valid tab id");
        assert_eq!(serde_json::to_string(&tab).expect("serialize"), "42");
        let back: TabId = serde_json::from_str("42").expect("parse");
        assert_eq!(back, tab);
        assert!(serde_json::from_str::<TabId>("0").is_err());
    }

    #[test]
    fn test_param_ids_are_unique() {
        assert_ne!(ParamId::generate(), ParamId::generate());
    }

    #[test]
    fn test_port_ids_increase() {
        let a = PortId::next();
        let b = PortId::next();
        assert!(b.as_u64() > a.as_u64());
        assert!(a.to_string().starts_with("port-"));
    }
}
