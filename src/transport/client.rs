//! Popup-side request client.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::debug;

use crate::capture::CaptureEvent;
use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::protocol::{Command, HistoryAction, LinkCategory, LinkMap, Request, Response};

use super::hub::HubMessage;

// ============================================================================
// Client
// ============================================================================

/// Sends commands to the background hub and awaits the responses.
///
/// Every call suspends until the hub replies or the request timeout
/// elapses.
#[derive(Clone)]
pub struct Client {
    message_tx: mpsc::UnboundedSender<HubMessage>,
    request_timeout: Duration,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub(crate) fn new(message_tx: mpsc::UnboundedSender<HubMessage>, request_timeout: Duration) -> Self {
        Self {
            message_tx,
            request_timeout,
        }
    }

    /// Returns the request timeout.
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Sends a request and waits for its response.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelUnavailable`] if the hub is gone
    /// - [`Error::RequestTimeout`] if no response arrives in time
    pub async fn send(&self, request: Request) -> Result<Response> {
        let request_id = request.id;
        let (response_tx, response_rx) = oneshot::channel();

        self.message_tx
            .send(HubMessage::Request {
                request,
                response_tx,
            })
            .map_err(|_| Error::channel_unavailable("background hub stopped"))?;

        match timeout(self.request_timeout, response_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(Error::channel_unavailable("background hub dropped the request")),
            Err(_) => {
                debug!(request_id = %request_id, "Request timed out");
                Err(Error::request_timeout(
                    request_id,
                    u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }

    /// Sends a raw JSON request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCommand`] for an unrecognized `name`, plus
    /// every error of [`send`](Self::send).
    pub async fn send_json(&self, text: &str) -> Result<Response> {
        self.send(Request::parse(text)?).await
    }

    /// Runs `command` and deserializes its result.
    async fn call<T: DeserializeOwned>(&self, tab_id: Option<TabId>, command: Command) -> Result<T> {
        self.send(Request::new(tab_id, command)).await?.into_typed()
    }

    /// Reads the tab's current URL.
    ///
    /// # Errors
    ///
    /// Channel errors, or [`Error::Protocol`] if the hub reports a failure.
    pub async fn get_url(&self, tab_id: TabId) -> Result<String> {
        self.call(Some(tab_id), Command::GetUrl).await
    }

    /// Navigates the tab, or reloads it when `url` is `None`.
    ///
    /// # Errors
    ///
    /// Channel errors, or [`Error::Protocol`] if the hub reports a failure.
    pub async fn set_url(&self, tab_id: TabId, url: Option<&str>) -> Result<bool> {
        self.call(Some(tab_id), Command::SetUrl(url.map(str::to_string)))
            .await
    }

    /// Reloads the tab, at `url` when given.
    ///
    /// # Errors
    ///
    /// Channel errors, or [`Error::Protocol`] if the hub reports a failure.
    pub async fn reload_page(&self, tab_id: TabId, url: Option<&str>) -> Result<bool> {
        self.call(Some(tab_id), Command::ReloadPage(url.map(str::to_string)))
            .await
    }

    /// Opens `url` in a new tab.
    ///
    /// # Errors
    ///
    /// Channel errors, or [`Error::Protocol`] if the hub reports a failure.
    pub async fn open_url(&self, tab_id: TabId, url: &str) -> Result<bool> {
        self.call(Some(tab_id), Command::OpenUrl(url.to_string()))
            .await
    }

    /// Steps through the tab's history.
    ///
    /// # Errors
    ///
    /// Channel errors, or [`Error::Protocol`] if the hub reports a failure.
    pub async fn forward_and_back(&self, tab_id: TabId, action: HistoryAction) -> Result<()> {
        let _: Value = self
            .call(Some(tab_id), Command::ForwardAndBack { action })
            .await?;
        Ok(())
    }

    /// Collects link URLs from the page.
    ///
    /// # Errors
    ///
    /// Channel errors, or [`Error::Protocol`] if the hub reports a failure.
    pub async fn get_links(&self, tab_id: TabId, categories: &[LinkCategory]) -> Result<LinkMap> {
        self.call(Some(tab_id), Command::GetLinks(categories.to_vec()))
            .await
    }

    /// Reads the capture buffer.
    ///
    /// # Errors
    ///
    /// Channel errors only.
    pub async fn get_request_url(&self, scene: &str) -> Result<Vec<CaptureEvent>> {
        self.call(None, Command::GetRequestUrl(scene.to_string()))
            .await
    }

    /// Reads the capture buffer under the login-access name.
    ///
    /// # Errors
    ///
    /// Channel errors only.
    pub async fn get_login_access_url(&self, scene: &str) -> Result<Vec<CaptureEvent>> {
        self.call(None, Command::GetLoginAccessUrl(scene.to_string()))
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
