//! Background hub and its event loop.
//!
//! The hub spawns one tokio task that owns the [`CaptureSessionManager`]
//! and drains a single queue:
//!
//! - command requests from [`Client`]s
//! - [`ListenerControl`] messages and disconnects from [`Port`]s
//! - browser tab events
//!
//! Messages are handled one at a time, in arrival order. A handler that
//! awaits the browser finishes before the next message is looked at, so no
//! two handlers ever interleave over the session state.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

use crate::capture::{CaptureSessionManager, RequestInterceptor};
use crate::error::{Error, Result};
use crate::identifiers::{PortId, TabId};
use crate::options::Options;
use crate::protocol::{
    Command, Event, HistoryAction, LinkCategory, LinkMap, ListenerControl, Request, Response,
    TabEvent,
};

use super::client::Client;
use super::port::Port;

// ============================================================================
// TabController
// ============================================================================

/// Browser-side operations on tabs.
#[async_trait]
pub trait TabController: Send + Sync {
    /// Returns the tab's current URL.
    async fn get_url(&self, tab_id: TabId) -> Result<String>;

    /// Navigates the tab to `url`.
    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<()>;

    /// Reloads the tab.
    async fn reload(&self, tab_id: TabId) -> Result<()>;

    /// Opens `url` in a new tab next to `tab_id`.
    async fn open(&self, tab_id: TabId, url: &str) -> Result<()>;

    /// Goes one entry back in the tab's history.
    async fn go_back(&self, tab_id: TabId) -> Result<()>;

    /// Goes one entry forward in the tab's history.
    async fn go_forward(&self, tab_id: TabId) -> Result<()>;

    /// Collects link URLs of the requested categories, in page order.
    async fn links(&self, tab_id: TabId, categories: &[LinkCategory]) -> Result<LinkMap>;
}

// ============================================================================
// HubMessage
// ============================================================================

/// Internal messages for the event loop.
pub(crate) enum HubMessage {
    /// A command request and where to send its response.
    Request {
        request: Request,
        response_tx: oneshot::Sender<Response>,
    },
    /// A control message posted on a port.
    Control {
        port: PortId,
        control: ListenerControl,
    },
    /// A port went away.
    Disconnect(PortId),
    /// A browser tab event.
    Tab(Event),
    /// Stop the loop.
    Shutdown,
}

// ============================================================================
// Hub
// ============================================================================

/// Handle to the background hub.
///
/// Cloning the handle does not spawn a second loop. The loop runs until
/// [`shutdown`](Self::shutdown) is called or every handle, client and port
/// is gone.
#[derive(Clone)]
pub struct Hub {
    message_tx: mpsc::UnboundedSender<HubMessage>,
    options: Options,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("options", &self.options)
            .field("closed", &self.message_tx.is_closed())
            .finish()
    }
}

impl Hub {
    /// Spawns the hub loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `options` are invalid.
    pub fn spawn(
        tabs: Arc<dyn TabController>,
        interceptor: Arc<dyn RequestInterceptor>,
        options: Options,
    ) -> Result<Self> {
        options.validate()?;

        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let manager = CaptureSessionManager::new(interceptor);

        tokio::spawn(Self::run_event_loop(message_rx, tabs, manager));
        info!("Background hub started");

        Ok(Self {
            message_tx,
            options,
        })
    }

    /// Returns the hub options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Creates a request client.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::new(self.message_tx.clone(), self.options.request_timeout)
    }

    /// Opens a duplex port. Dropping it counts as a disconnect.
    #[must_use]
    pub fn connect(&self) -> Port {
        Port::new(PortId::next(), self.message_tx.clone())
    }

    /// Delivers one browser tab event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelUnavailable`] if the hub has stopped.
    pub fn dispatch_event(&self, event: Event) -> Result<()> {
        self.message_tx
            .send(HubMessage::Tab(event))
            .map_err(|_| Error::channel_unavailable("background hub stopped"))
    }

    /// Forwards a stream of browser events until it ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelUnavailable`] if the hub stops first.
    pub async fn forward_events<S>(&self, events: S) -> Result<()>
    where
        S: Stream<Item = Event> + Send,
    {
        let mut events = std::pin::pin!(events);
        while let Some(event) = events.next().await {
            self.dispatch_event(event)?;
        }
        Ok(())
    }

    /// Stops the loop. Any live capture session is stopped with it.
    pub fn shutdown(&self) {
        let _ = self.message_tx.send(HubMessage::Shutdown);
    }

    /// Event loop: one message at a time.
    async fn run_event_loop(
        mut message_rx: mpsc::UnboundedReceiver<HubMessage>,
        tabs: Arc<dyn TabController>,
        mut manager: CaptureSessionManager,
    ) {
        while let Some(message) = message_rx.recv().await {
            match message {
                HubMessage::Request {
                    request,
                    response_tx,
                } => {
                    let id = request.id;
                    let response = match Self::handle_request(&request, tabs.as_ref(), &manager).await
                    {
                        Ok(result) => Response::success(id, result),
                        Err(e) => {
                            warn!(command = %request.command, error = %e, "Command failed");
                            Response::failure(id, &e)
                        }
                    };

                    if response_tx.send(response).is_err() {
                        debug!(request_id = %id, "Requester gone before response");
                    }
                }

                HubMessage::Control { port, control } => {
                    Self::handle_control(port, control, &mut manager);
                }

                HubMessage::Disconnect(port) => {
                    debug!(port = %port, "Port disconnected");
                    manager.on_disconnect(port);
                }

                HubMessage::Tab(event) => Self::handle_tab_event(&event, &mut manager),

                HubMessage::Shutdown => {
                    debug!("Shutdown message received");
                    break;
                }
            }
        }

        manager.stop();
        info!("Background hub stopped");
    }

    /// Executes one command.
    async fn handle_request(
        request: &Request,
        tabs: &dyn TabController,
        manager: &CaptureSessionManager,
    ) -> Result<Value> {
        trace!(request_id = %request.id, command = %request.command, "Handling request");

        match &request.command {
            Command::GetUrl => {
                let url = tabs.get_url(request.require_tab()?).await?;
                Ok(Value::String(url))
            }

            Command::SetUrl(target) | Command::ReloadPage(target) => {
                let tab_id = request.require_tab()?;
                match target.as_deref().filter(|url| !url.is_empty()) {
                    Some(url) => tabs.navigate(tab_id, url).await?,
                    None => tabs.reload(tab_id).await?,
                }
                Ok(Value::Bool(true))
            }

            Command::OpenUrl(url) => {
                tabs.open(request.require_tab()?, url).await?;
                Ok(Value::Bool(true))
            }

            Command::ForwardAndBack { action } => {
                let tab_id = request.require_tab()?;
                match action {
                    HistoryAction::Back => tabs.go_back(tab_id).await?,
                    HistoryAction::Forward => tabs.go_forward(tab_id).await?,
                }
                Ok(Value::Null)
            }

            Command::GetLinks(categories) => {
                let links = tabs.links(request.require_tab()?, categories).await?;
                Ok(serde_json::to_value(links)?)
            }

            Command::GetRequestUrl(scene) | Command::GetLoginAccessUrl(scene) => {
                let events = manager.drain();
                debug!(scene = %scene, count = events.len(), "Capture buffer read");
                Ok(serde_json::to_value(events)?)
            }
        }
    }

    /// Applies a port control message.
    fn handle_control(port: PortId, control: ListenerControl, manager: &mut CaptureSessionManager) {
        debug!(port = %port, tab_id = %control.tab_id, enable = control.enable, "Listener control");

        if let Some(source) = &control.url_reg {
            manager.remember_pattern(source);
        }

        if control.enable {
            if let Err(e) = manager.start(port, control.tab_id, None) {
                warn!(port = %port, tab_id = %control.tab_id, error = %e, "Failed to start capture");
            }
        } else {
            manager.stop();
        }
    }

    /// Routes a browser tab event.
    fn handle_tab_event(event: &Event, manager: &mut CaptureSessionManager) {
        match event.parse() {
            TabEvent::RequestObserved { tab_id, event } => {
                manager.on_request_observed(tab_id, event);
            }
            TabEvent::NavigationStarted { tab_id, url } => {
                trace!(tab_id = %tab_id, url = %url, "Navigation started");
                manager.on_navigation(tab_id);
            }
            TabEvent::Unknown { method, .. } => {
                trace!(method = %method, "Ignoring tab event");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
