//! Tab-scoped, regex-filtered request capture.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CaptureSessionManager`] | the single live session and its buffer |
//! | [`CaptureEvent`] | one observed request |
//! | [`UrlMatcher`] | compiled session filter |
//! | [`CaptureRules`] | named env → scene patterns |
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start──▶ Listening ──stop / owner disconnect──▶ Idle
//!                    │  ▲
//!                    └──┘ start (previous listener torn down)
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Stored capture rules.
pub mod config;

/// Session manager and interceptor seam.
pub mod manager;

/// Session state, events and URL filter.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{CaptureRules, RuleRow, SceneRule};
pub use manager::{CaptureSessionManager, RequestInterceptor};
pub use session::{CaptureEvent, Listening, SessionState, UrlMatcher, validate_pattern};
