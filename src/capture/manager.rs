//! Process-wide capture session manager.
//!
//! At most one session listens at a time. Starting a session tears down the
//! previous listener and discards its buffer before the new one is
//! installed, so a stale owner can never observe the new session's events.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, trace};

use crate::error::Result;
use crate::identifiers::{InterceptId, PortId, TabId};

use super::session::{CaptureEvent, Listening, SessionState, UrlMatcher};

// ============================================================================
// RequestInterceptor
// ============================================================================

/// Browser-side request listener registration.
///
/// Installed listeners feed [`CaptureSessionManager::on_request_observed`].
pub trait RequestInterceptor: Send + Sync {
    /// Installs a listener for every outgoing request of `tab_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser refuses the listener.
    fn install(&self, tab_id: TabId) -> Result<InterceptId>;

    /// Removes a listener. Removing an unknown id does nothing.
    fn remove(&self, id: &InterceptId);
}

// ============================================================================
// CaptureSessionManager
// ============================================================================

/// Owns the single capture session and its event buffer.
pub struct CaptureSessionManager {
    interceptor: Arc<dyn RequestInterceptor>,
    state: SessionState,
    buffer: Vec<CaptureEvent>,
    seen: FxHashSet<CaptureEvent>,
    pattern: Option<String>,
}

impl std::fmt::Debug for CaptureSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSessionManager")
            .field("state", &self.state)
            .field("buffered", &self.buffer.len())
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CaptureSessionManager - Accessors
// ============================================================================

impl CaptureSessionManager {
    /// Creates an idle manager.
    #[must_use]
    pub fn new(interceptor: Arc<dyn RequestInterceptor>) -> Self {
        Self {
            interceptor,
            state: SessionState::Idle,
            buffer: Vec::new(),
            seen: FxHashSet::default(),
            pattern: None,
        }
    }

    /// Returns the session state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns `true` while a session listens.
    #[inline]
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state.is_listening()
    }

    /// Returns the port owning the live session.
    #[must_use]
    pub fn owner(&self) -> Option<PortId> {
        self.state.listening().map(|session| session.owner)
    }

    /// Returns the pattern the next start falls back to.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Returns the number of buffered events.
    #[inline]
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

// ============================================================================
// CaptureSessionManager - Lifecycle
// ============================================================================

impl CaptureSessionManager {
    /// Remembers a pattern for the next start without touching the session.
    ///
    /// Empty sources are ignored.
    pub fn remember_pattern(&mut self, source: &str) {
        if !source.is_empty() {
            self.pattern = Some(source.to_string());
        }
    }

    /// Starts listening on `tab_id` on behalf of `owner`.
    ///
    /// `pattern` replaces the remembered pattern when given and non-empty.
    /// Any live session is torn down first and its buffer discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be installed. The manager is
    /// idle afterwards.
    pub fn start(&mut self, owner: PortId, tab_id: TabId, pattern: Option<&str>) -> Result<()> {
        if let Some(source) = pattern {
            self.remember_pattern(source);
        }

        self.teardown();

        let matcher = UrlMatcher::compile(self.pattern.as_deref().unwrap_or_default());
        let intercept = self.interceptor.install(tab_id)?;

        info!(
            owner = %owner,
            tab_id = %tab_id,
            pattern = ?matcher.as_str(),
            "Capture session started"
        );

        self.state = SessionState::Listening(Listening {
            owner,
            tab_id,
            matcher,
            intercept,
        });
        Ok(())
    }

    /// Stops the session and clears the buffer.
    ///
    /// Safe to call when idle. Returns `true` if a listener was removed.
    pub fn stop(&mut self) -> bool {
        let stopped = self.teardown();
        if stopped {
            info!("Capture session stopped");
        }
        stopped
    }

    /// Handles a port disconnect.
    ///
    /// Only the current owner's disconnect stops the session. Returns
    /// `true` if it did.
    pub fn on_disconnect(&mut self, port: PortId) -> bool {
        if self.owner() != Some(port) {
            debug!(port = %port, "Ignoring disconnect of non-owner port");
            return false;
        }
        self.stop()
    }

    /// Handles the start of a navigation in `tab_id`.
    ///
    /// Events of the listening tab belong to the page being left, so the
    /// buffer is cleared. The listener stays installed.
    pub fn on_navigation(&mut self, tab_id: TabId) -> bool {
        let listening_here = self
            .state
            .listening()
            .is_some_and(|session| session.tab_id == tab_id);

        if !listening_here || self.buffer.is_empty() {
            return false;
        }

        debug!(tab_id = %tab_id, dropped = self.buffer.len(), "Capture buffer cleared on navigation");
        self.clear_buffer();
        true
    }

    fn teardown(&mut self) -> bool {
        let previous = std::mem::take(&mut self.state);
        self.clear_buffer();

        match previous {
            SessionState::Listening(session) => {
                self.interceptor.remove(&session.intercept);
                debug!(owner = %session.owner, tab_id = %session.tab_id, "Capture listener removed");
                true
            }
            SessionState::Idle => false,
        }
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.seen.clear();
    }
}

// ============================================================================
// CaptureSessionManager - Events
// ============================================================================

impl CaptureSessionManager {
    /// Offers one observed request to the session.
    ///
    /// The event is buffered only while listening on `tab_id`, when its URL
    /// passes the filter and it is not already buffered. Returns `true` if
    /// it was appended.
    pub fn on_request_observed(&mut self, tab_id: TabId, event: CaptureEvent) -> bool {
        let Some(session) = self.state.listening() else {
            return false;
        };
        if session.tab_id != tab_id || !session.matcher.is_match(&event.url) {
            return false;
        }
        if !self.seen.insert(event.clone()) {
            return false;
        }

        trace!(tab_id = %tab_id, url = %event.url, "Request captured");
        self.buffer.push(event);
        true
    }

    /// Returns a snapshot of the buffer in arrival order.
    ///
    /// The buffer is not cleared.
    #[must_use]
    pub fn drain(&self) -> Vec<CaptureEvent> {
        self.buffer.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
