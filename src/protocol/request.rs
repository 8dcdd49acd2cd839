//! Request and Response message types.
//!
//! A request carries a [`Command`] plus the correlation id that its
//! response echoes back.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, TabId};

use super::Command;

// ============================================================================
// Request
// ============================================================================

/// A command request from the popup to the background hub.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "tabId": 1,
///   "name": "setURL",
///   "data": "https://example.com/"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Target tab. Absent for commands that act on background state only.
    #[serde(rename = "tabId", default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,

    /// Command name and payload.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a request with a generated id.
    #[inline]
    #[must_use]
    pub fn new(tab_id: Option<TabId>, command: Command) -> Self {
        Self {
            id: RequestId::generate(),
            tab_id,
            command,
        }
    }

    /// Parses a JSON request, naming unknown commands explicitly.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownCommand`] if `name` is not a known command
    /// - [`Error::Protocol`] if `name` is missing
    /// - [`Error::Json`] for malformed JSON or payloads
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let name = value
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol("request has no command name"))?;
        if !Command::NAMES.contains(&name) {
            return Err(Error::unknown_command(name));
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Returns the target tab or fails for tab commands without one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the command needs a tab and none was
    /// given.
    pub fn require_tab(&self) -> Result<TabId> {
        self.tab_id
            .ok_or_else(|| Error::protocol(format!("{} requires a tabId", self.command)))
    }
}

// ============================================================================
// Response
// ============================================================================

/// A response from the background hub.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": "uuid", "type": "success", "result": true }
/// ```
///
/// Error:
/// ```json
/// { "id": "uuid", "type": "error", "error": "malformed url", "message": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Response type.
    #[serde(rename = "type")]
    pub response_type: ResponseType,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error code (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error message (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    /// Creates a success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id,
            response_type: ResponseType::Success,
            result: Some(result),
            error: None,
            message: None,
        }
    }

    /// Creates an error response from a crate error.
    #[must_use]
    pub fn failure(id: RequestId, error: &Error) -> Self {
        Self {
            id,
            response_type: ResponseType::Error,
            result: None,
            error: Some(error_code(error).to_string()),
            message: Some(error.to_string()),
        }
    }

    /// Returns `true` if this is a success response.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response was an error.
    pub fn into_result(self) -> Result<Value> {
        match self.response_type {
            ResponseType::Success => Ok(self.result.unwrap_or(Value::Null)),
            ResponseType::Error => {
                let error_code = self.error.unwrap_or_else(|| "unknown error".to_string());
                let message = self.message.unwrap_or_else(|| error_code.clone());
                Err(Error::protocol(message))
            }
        }
    }

    /// Extracts and deserializes the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for error responses and [`Error::Json`]
    /// if the result has an unexpected shape.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.into_result()?)?)
    }
}

/// Short, stable code for an error response.
#[must_use]
pub fn error_code(error: &Error) -> &'static str {
    match error {
        Error::MalformedUrl { .. } => "malformed url",
        Error::InvalidRecordShape { .. } => "invalid record shape",
        Error::PatternCompileFailure { .. } => "pattern compile failure",
        Error::ChannelUnavailable { .. } => "channel unavailable",
        Error::RequestTimeout { .. } => "timeout",
        Error::Protocol { .. } => "protocol error",
        Error::UnknownCommand { .. } => "unknown command",
        Error::TabNotFound { .. } => "no such tab",
        Error::Config { .. } => "invalid configuration",
        Error::Io(_) | Error::Json(_) => "internal error",
    }
}

// ============================================================================
// ResponseType
// ============================================================================

/// Response type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Successful response.
    Success,
    /// Error response.
    Error,
}

// ============================================================================
// Tests
// ============================================================================
