//! Error types for the URL workbench.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use url_workbench::{Result, UrlStateModel};
//!
//! fn example(model: &mut UrlStateModel) -> Result<()> {
//!     model.load("https://example.com/?q=1")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | URL | [`Error::MalformedUrl`] |
//! | History | [`Error::InvalidRecordShape`] |
//! | Capture | [`Error::PatternCompileFailure`] |
//! | Channel | [`Error::ChannelUnavailable`], [`Error::RequestTimeout`] |
//! | Protocol | [`Error::Protocol`], [`Error::UnknownCommand`], [`Error::TabNotFound`] |
//! | Configuration | [`Error::Config`] |
//! | External | [`Error::Io`], [`Error::Json`] |
//!
//! None of these conditions is fatal. Every one of them leaves the core
//! state as it was and only carries a signal the caller may display.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // URL Errors
    // ========================================================================
    /// The string could not be interpreted as an absolute URI.
    ///
    /// Callers treat this as "keep the previous state".
    #[error("Malformed URL '{url}': {message}")]
    MalformedUrl {
        /// The rejected input.
        url: String,
        /// Parser message.
        message: String,
    },

    // ========================================================================
    // History Errors
    // ========================================================================
    /// A manually edited host record failed validation.
    ///
    /// The store is left unmodified.
    #[error("Invalid record shape: {message}")]
    InvalidRecordShape {
        /// Which part of the record is wrong.
        message: String,
    },

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// A capture pattern does not compile.
    ///
    /// Sessions never fail on this; it is only reported by validation.
    #[error("Pattern '{pattern}' does not compile: {message}")]
    PatternCompileFailure {
        /// Pattern source.
        pattern: String,
        /// Regex engine message.
        message: String,
    },

    // ========================================================================
    // Channel Errors
    // ========================================================================
    /// The collaborator surface is unreachable.
    #[error("Channel unavailable: {message}")]
    ChannelUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// A request received no reply in time.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or error response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Unknown message name.
    #[error("Unknown command: {command}")]
    UnknownCommand {
        /// The unrecognized name.
        command: String,
    },

    /// A tab-scoped command was sent without a usable tab.
    #[error("Tab not found: {tab_id}")]
    TabNotFound {
        /// The missing tab ID.
        tab_id: TabId,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a malformed URL error.
    #[inline]
    pub fn malformed_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid record shape error.
    #[inline]
    pub fn invalid_record_shape(message: impl Into<String>) -> Self {
        Self::InvalidRecordShape {
            message: message.into(),
        }
    }

    /// Creates a pattern compile failure.
    #[inline]
    pub fn pattern_compile_failure(
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::PatternCompileFailure {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates a channel unavailable error.
    #[inline]
    pub fn channel_unavailable(message: impl Into<String>) -> Self {
        Self::ChannelUnavailable {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    #[inline]
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Creates a tab not found error.
    #[inline]
    pub fn tab_not_found(tab_id: TabId) -> Self {
        Self::TabNotFound { tab_id }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Returns `true` if the collaborator surface could not be reached.
    #[inline]
    #[must_use]
    pub fn is_channel_error(&self) -> bool {
        matches!(
            self,
            Self::ChannelUnavailable { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this error came from user-supplied input.
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedUrl { .. }
                | Self::InvalidRecordShape { .. }
                | Self::PatternCompileFailure { .. }
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors leave core state untouched; the caller may show a
    /// notice and carry on.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.is_input_error() || self.is_channel_error()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::channel_unavailable("background gone");
        assert_eq!(err.to_string(), "Channel unavailable: background gone");
    }

    #[test]
    fn test_malformed_url_display() {
        let err = Error::malformed_url("nope", "relative URL without a base");
        assert_eq!(
            err.to_string(),
            "Malformed URL 'nope': relative URL without a base"
        );
    }

    #[test]
    fn test_is_timeout() {
        let timeout_err = Error::request_timeout(RequestId::generate(), 5000);
        let other_err = Error::protocol("test");

        assert!(timeout_err.is_timeout());
        assert!(!other_err.is_timeout());
    }

    #[test]
    fn test_is_channel_error() {
        assert!(Error::channel_unavailable("x").is_channel_error());
        assert!(Error::request_timeout(RequestId::generate(), 1).is_channel_error());
        assert!(!Error::config("x").is_channel_error());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::malformed_url("a", "b").is_recoverable());
        assert!(Error::invalid_record_shape("path").is_recoverable());
        assert!(Error::pattern_compile_failure("(", "unclosed").is_recoverable());
        assert!(!Error::config("test").is_recoverable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
