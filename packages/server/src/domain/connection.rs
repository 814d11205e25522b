//! Outbound side of a live connection.
//!
//! Every connection owns one writer task that drains an unbounded queue of
//! [`OutboundFrame`]s into the socket. The rest of the server only ever sees a
//! [`ConnectionHandle`], so queuing a frame never blocks and never touches the
//! network while a registry lock is held.

use tokio::sync::mpsc;

use super::error::DeliveryError;

/// A frame queued for delivery to one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    /// Plain text frame (status notices and chat lines)
    Text(String),
    /// Ask the writer to send a close frame and stop
    Close,
}

/// Cloneable sender half of a connection's outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    sender: mpsc::UnboundedSender<OutboundFrame>,
}

impl ConnectionHandle {
    /// Wrap an existing queue sender.
    pub fn new(sender: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self { sender }
    }

    /// Create a handle together with the receiver its writer task drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }

    /// Queue a text frame.
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), DeliveryError> {
        self.sender
            .send(OutboundFrame::Text(text.into()))
            .map_err(|_| DeliveryError::ConnectionClosed)
    }

    /// Queue a close request. Frames queued earlier are still written first.
    pub fn close(&self) -> Result<(), DeliveryError> {
        self.sender
            .send(OutboundFrame::Close)
            .map_err(|_| DeliveryError::ConnectionClosed)
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
