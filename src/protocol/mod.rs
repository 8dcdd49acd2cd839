//! Message types between the popup, the background hub and the browser.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Popup → Hub | Command request |
//! | `Response` | Hub → Popup | Command response |
//! | `ListenerControl` | Popup port → Hub | Capture open / close |
//! | `Event` | Browser → Hub | Tab notification |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command names and payloads |
//! | `event` | Port control and tab events |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions.
pub mod command;

/// Port control and tab event types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, HistoryAction, LinkCategory, LinkEntry, LinkMap, link_entries};
pub use event::{Event, ListenerControl, TabEvent};
pub use request::{Request, Response, ResponseType, error_code};
