//! Per-host history of parameter values, paths and fragments.
//!
//! Feeds autocomplete: every committed URL pushes its values to the front
//! of bounded, duplicate-free sequences kept per host.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HistoryStore`] | host → [`HostRecord`] mapping |
//! | [`HostRecord`] | bounded sequences of one host |
//! | [`Suggestions`] | autocomplete candidates |
//!
//! # Insertion Policy
//!
//! Move-to-front with de-duplication: a value already at the front is left
//! alone, a value further back is moved to the front, a new value is
//! prepended and the oldest entry falls off once the cap is exceeded.

// ============================================================================
// Submodules
// ============================================================================

/// Host record type, bounded insert and validation.
pub mod record;

/// The host-keyed store.
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use record::{HostRecord, parse_record, touch_front, validate_record};
pub use store::{HistoryStore, Suggestions};
