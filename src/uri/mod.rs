//! URL decoding, parameter identity and the editing model.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ParsedUrl`] | structured fields of one URL |
//! | [`ParamEntry`] | query parameter with a stable id |
//! | [`UrlStateModel`] | current URL plus editable fields |
//!
//! [`decode`] and [`encode`] are pure; [`merge_params`] carries parameter
//! ids across reloads so edits keep pointing at the same entry.

// ============================================================================
// Submodules
// ============================================================================

/// URL string ↔ [`ParsedUrl`].
pub mod codec;

/// Identity-preserving parameter reconciliation.
pub mod merge;

/// The stateful editing model.
pub mod model;

// ============================================================================
// Re-exports
// ============================================================================

pub use codec::{ParsedUrl, decode, encode};
pub use merge::{ParamEntry, merge_params};
pub use model::{UrlField, UrlStateModel};
