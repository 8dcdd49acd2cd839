//! Workbench configuration.
//!
//! Holds the history caps and channel timing. Values are plain data with
//! `with_*` builder methods.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use url_workbench::{HistoryLimits, Options};
//!
//! let options = Options::new()
//!     .with_history(HistoryLimits::new().with_param_values(50))
//!     .with_request_timeout(Duration::from_secs(2));
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Values remembered per parameter key.
pub const DEFAULT_PARAM_VALUE_CAP: usize = 20;

/// Paths remembered per host.
pub const DEFAULT_PATH_CAP: usize = 10;

/// Fragments remembered per host.
pub const DEFAULT_FRAGMENT_CAP: usize = 10;

/// Default time a client waits for the background hub to answer.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// HistoryLimits
// ============================================================================

/// Caps on the bounded sequences of a host record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Max values kept per parameter key.
    pub param_values: usize,

    /// Max distinct paths kept per host.
    pub paths: usize,

    /// Max distinct fragments kept per host.
    pub fragments: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLimits {
    /// Creates limits with the default caps (20 / 10 / 10).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            param_values: DEFAULT_PARAM_VALUE_CAP,
            paths: DEFAULT_PATH_CAP,
            fragments: DEFAULT_FRAGMENT_CAP,
        }
    }

    /// Sets the per-key value cap.
    #[inline]
    #[must_use]
    pub fn with_param_values(mut self, cap: usize) -> Self {
        self.param_values = cap;
        self
    }

    /// Sets the path cap.
    #[inline]
    #[must_use]
    pub fn with_paths(mut self, cap: usize) -> Self {
        self.paths = cap;
        self
    }

    /// Sets the fragment cap.
    #[inline]
    #[must_use]
    pub fn with_fragments(mut self, cap: usize) -> Self {
        self.fragments = cap;
        self
    }

    /// Validates the caps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any cap is zero.
    pub fn validate(&self) -> Result<()> {
        if self.param_values == 0 || self.paths == 0 || self.fragments == 0 {
            return Err(Error::config("History caps must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Options
// ============================================================================

/// Top-level workbench options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// History caps.
    pub history: HistoryLimits,

    /// How long a client waits for a reply.
    pub request_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self::new()
    }
}

impl Options {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            history: HistoryLimits::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replaces the history caps.
    #[inline]
    #[must_use]
    pub fn with_history(mut self, history: HistoryLimits) -> Self {
        self.history = history;
        self
    }

    /// Sets the client request timeout.
    #[inline]
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for zero caps or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        self.history.validate()?;
        if self.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
