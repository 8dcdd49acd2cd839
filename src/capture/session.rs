//! Capture session state and URL filter.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::identifiers::{InterceptId, PortId, TabId};

// ============================================================================
// CaptureEvent
// ============================================================================

/// One observed outgoing request.
///
/// Two events are the same capture when all three fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureEvent {
    /// Request URL.
    pub url: String,

    /// Origin that issued the request, when the browser reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,

    /// HTTP method.
    pub method: String,
}

impl CaptureEvent {
    /// Creates an event without initiator.
    #[must_use]
    pub fn new(url: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            initiator: None,
            method: method.into(),
        }
    }

    /// Sets the initiator.
    #[must_use]
    pub fn with_initiator(mut self, initiator: impl Into<String>) -> Self {
        self.initiator = Some(initiator.into());
        self
    }
}

// ============================================================================
// UrlMatcher
// ============================================================================

/// Compiled URL filter of a session.
#[derive(Clone)]
pub enum UrlMatcher {
    /// Unanchored search with a compiled pattern.
    Pattern(Regex),

    /// Matches nothing. Used when no pattern is set or it failed to compile.
    Never,
}

impl UrlMatcher {
    /// Compiles `source`, degrading to [`UrlMatcher::Never`] on failure.
    ///
    /// An empty source also yields `Never`.
    #[must_use]
    pub fn compile(source: &str) -> Self {
        if source.is_empty() {
            return Self::Never;
        }
        match validate_pattern(source) {
            Ok(regex) => Self::Pattern(regex),
            Err(e) => {
                warn!(pattern = %source, error = %e, "Capture pattern rejected, nothing will match");
                Self::Never
            }
        }
    }

    /// Returns `true` if `url` passes the filter.
    #[inline]
    #[must_use]
    pub fn is_match(&self, url: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(url),
            Self::Never => false,
        }
    }

    /// Returns the pattern source, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Pattern(regex) => Some(regex.as_str()),
            Self::Never => None,
        }
    }
}

impl fmt::Debug for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Never => f.write_str("Never"),
        }
    }
}

/// Compiles a capture pattern, reporting why it is invalid.
///
/// # Errors
///
/// Returns [`Error::PatternCompileFailure`] with the compiler message.
pub fn validate_pattern(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| Error::pattern_compile_failure(source, e.to_string()))
}

// ============================================================================
// SessionState
// ============================================================================

/// The live subscription of a listening session.
#[derive(Debug, Clone)]
pub struct Listening {
    /// Port that opened the session.
    pub owner: PortId,

    /// Tab whose requests are observed.
    pub tab_id: TabId,

    /// URL filter.
    pub matcher: UrlMatcher,

    /// Handle of the installed request listener.
    pub intercept: InterceptId,
}

/// Lifecycle of the process-wide capture session.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No listener installed.
    #[default]
    Idle,

    /// Listening on one tab.
    Listening(Listening),
}

impl SessionState {
    /// Returns the listening session, if any.
    #[inline]
    #[must_use]
    pub fn listening(&self) -> Option<&Listening> {
        match self {
            Self::Listening(session) => Some(session),
            Self::Idle => None,
        }
    }

    /// Returns `true` while listening.
    #[inline]
    #[must_use]
    pub fn is_listening(&self) -> bool {
        matches!(self, Self::Listening(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
