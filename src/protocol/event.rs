//! Port control and browser tab event types.
//!
//! # Messages
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`ListenerControl`] | popup port → hub | open or close capture |
//! | [`Event`] | browser → hub | raw tab notification |
//! | [`TabEvent`] | parsed [`Event`] | typed notification |
//!
//! # Event Methods
//!
//! | Method | Parsed as |
//! |--------|-----------|
//! | `webRequest.beforeRequest` | [`TabEvent::RequestObserved`] |
//! | `webNavigation.beforeNavigate` | [`TabEvent::NavigationStarted`] |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capture::CaptureEvent;
use crate::identifiers::TabId;

// ============================================================================
// ListenerControl
// ============================================================================

/// Capture control message posted on a popup port.
///
/// # Format
///
/// ```json
/// { "tabId": 7, "enable": true, "urlReg": "^https://api\\." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerControl {
    /// Tab to listen on.
    #[serde(rename = "tabId")]
    pub tab_id: TabId,

    /// `true` opens the session, `false` closes it.
    pub enable: bool,

    /// Pattern for the session. Absent keeps the previous one.
    #[serde(rename = "urlReg", default, skip_serializing_if = "Option::is_none")]
    pub url_reg: Option<String>,
}

impl ListenerControl {
    /// Creates an "open" message.
    #[must_use]
    pub fn open(tab_id: TabId, url_reg: impl Into<String>) -> Self {
        Self {
            tab_id,
            enable: true,
            url_reg: Some(url_reg.into()),
        }
    }

    /// Creates a "close" message.
    #[must_use]
    pub fn close(tab_id: TabId) -> Self {
        Self {
            tab_id,
            enable: false,
            url_reg: None,
        }
    }
}

// ============================================================================
// Event
// ============================================================================

/// A notification from the browser about one of its tabs.
///
/// # Format
///
/// ```json
/// {
///   "method": "webRequest.beforeRequest",
///   "params": { "tabId": 7, "url": "...", "method": "GET" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> TabEvent {
        let Some(tab_id) = self.tab_id() else {
            return self.unknown();
        };

        match self.method.as_str() {
            "webRequest.beforeRequest" => TabEvent::RequestObserved {
                tab_id,
                event: CaptureEvent {
                    url: self.get_string("url"),
                    initiator: self.get_optional_string("initiator"),
                    method: self.get_string_or("method", "GET"),
                },
            },

            "webNavigation.beforeNavigate" => TabEvent::NavigationStarted {
                tab_id,
                url: self.get_string("url"),
            },

            _ => self.unknown(),
        }
    }

    fn unknown(&self) -> TabEvent {
        TabEvent::Unknown {
            method: self.method.clone(),
            params: self.params.clone(),
        }
    }

    fn tab_id(&self) -> Option<TabId> {
        self.params
            .get("tabId")
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .and_then(TabId::new)
    }

    #[inline]
    fn get_string(&self, key: &str) -> String {
        self.get_string_or(key, "")
    }

    #[inline]
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    #[inline]
    fn get_optional_string(&self, key: &str) -> Option<String> {
        self.params.get(key).and_then(Value::as_str).map(str::to_string)
    }
}

// ============================================================================
// TabEvent
// ============================================================================

/// Parsed tab notification.
#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    /// An outgoing request is about to be sent.
    RequestObserved {
        /// Tab that issued the request.
        tab_id: TabId,
        /// Request details.
        event: CaptureEvent,
    },

    /// The tab started navigating away.
    NavigationStarted {
        /// Navigating tab.
        tab_id: TabId,
        /// Target URL.
        url: String,
    },

    /// Unrecognized method, or no usable tab id.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Tests
// ============================================================================
