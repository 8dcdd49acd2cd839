//! URL workbench - inspect, edit and replay browser tab URLs.
//!
//! This library is the engine behind a browser extension popup that edits
//! the URL of the active tab field by field, remembers previously used
//! values per host, and captures outgoing requests that match a pattern.
//!
//! # Architecture
//!
//! - **Popup side**: [`UrlStateModel`] keeps one URL and its derived fields
//!   in sync; [`Editor`] binds it to a tab through a [`Client`]
//! - **Background side**: [`Hub`] runs one event loop that owns the
//!   [`CaptureSessionManager`] and talks to the browser through
//!   [`TabController`] and [`RequestInterceptor`]
//! - **Storage**: [`HistoryStore`] and [`CaptureRules`] persist through a
//!   [`KeyValueStore`]
//!
//! # Quick Start
//!
//! ```
//! use url_workbench::{HistoryStore, Result, UrlField, UrlStateModel};
//!
//! fn main() -> Result<()> {
//!     let mut history = HistoryStore::new();
//!     let mut model = UrlStateModel::new();
//!
//!     model.load("https://example.com/search?q=rust#top")?;
//!     let id = model.params()[0].id;
//!     model.set_param_value(id, "tokio");
//!     model.edit_field(UrlField::Fragment, "results");
//!     assert_eq!(model.url(), "https://example.com/search?q=tokio#results");
//!
//!     model.commit(&mut history);
//!     let hints = history.suggestions("example.com", Some("q"));
//!     assert_eq!(hints.param_values, vec!["tokio".to_string()]);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`uri`] | Codec, parameter merge, [`UrlStateModel`] |
//! | [`history`] | Per-host bounded history |
//! | [`capture`] | Request capture sessions and rules |
//! | [`editor`] | Popup editing workflow |
//! | [`transport`] | [`Hub`], [`Client`], [`Port`] |
//! | [`protocol`] | Message types |
//! | [`storage`] | [`KeyValueStore`] and implementations |
//! | [`options`] | [`Options`] and [`HistoryLimits`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Tab-scoped request capture.
///
/// - [`CaptureSessionManager`] - the single live session
/// - [`CaptureRules`] - stored env → scene patterns
pub mod capture;

/// Popup editing workflow.
pub mod editor;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Per-host history of parameter values, paths and fragments.
pub mod history;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// Limits and timeouts.
pub mod options;

/// Message types between popup, hub and browser.
pub mod protocol;

/// Persistent key-value storage.
pub mod storage;

/// In-process transport: hub, client and ports.
pub mod transport;

/// URL codec, parameter merge and the editing model.
pub mod uri;

// ============================================================================
// Re-exports
// ============================================================================

// Capture types
pub use capture::{
    CaptureEvent, CaptureRules, CaptureSessionManager, RequestInterceptor, UrlMatcher,
    validate_pattern,
};

// Editor
pub use editor::Editor;

// Error types
pub use error::{Error, Result};

// History types
pub use history::{HistoryStore, HostRecord, Suggestions};

// Identifier types
pub use identifiers::{InterceptId, ParamId, PortId, RequestId, TabId};

// Options
pub use options::{HistoryLimits, Options};

// Storage
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};

// Transport types
pub use transport::{Client, Hub, Port, TabController};

// URL types
pub use uri::{ParamEntry, ParsedUrl, UrlField, UrlStateModel};
