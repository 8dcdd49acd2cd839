//! Duplex popup port.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{Error, Result};
use crate::identifiers::PortId;
use crate::protocol::ListenerControl;

use super::hub::HubMessage;

// ============================================================================
// Port
// ============================================================================

/// A popup's long-lived connection to the hub.
///
/// Posting is fire-and-forget. Dropping the port tells the hub it
/// disconnected, which stops a capture session this port owns.
pub struct Port {
    id: PortId,
    message_tx: mpsc::UnboundedSender<HubMessage>,
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Port {
    pub(crate) fn new(id: PortId, message_tx: mpsc::UnboundedSender<HubMessage>) -> Self {
        trace!(port = %id, "Port connected");
        Self { id, message_tx }
    }

    /// Returns the port id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Posts a capture control message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelUnavailable`] if the hub has stopped.
    pub fn post(&self, control: ListenerControl) -> Result<()> {
        self.message_tx
            .send(HubMessage::Control {
                port: self.id,
                control,
            })
            .map_err(|_| Error::channel_unavailable("background hub stopped"))
    }
}

impl Drop for Port {
    fn drop(&mut self) {
        // The hub may already be gone.
        let _ = self.message_tx.send(HubMessage::Disconnect(self.id));
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identifiers::TabId;

    #[test]
    fn test_drop_sends_disconnect() {
        let (message_tx, mut message_rx) = mpsc::unbounded_channel();
        let port = Port::new(PortId::next(), message_tx);
        let id = port.id();

        port.post(ListenerControl::close(TabId::new(1).expect("tab")))
            .expect("post");
        drop(port);

        assert!(matches!(message_rx.try_recv(), Ok(HubMessage::Control { port, .. }) if port == id));
        assert!(matches!(message_rx.try_recv(), Ok(HubMessage::Disconnect(port)) if port == id));
    }

    #[test]
    fn test_post_after_hub_stopped() {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        drop(message_rx);

        let port = Port::new(PortId::next(), message_tx);
        let err = port
            .post(ListenerControl::close(TabId::new(1).expect("tab")))
            .unwrap_err();
        assert!(err.is_channel_error());
    }
}
