//! Outbound frame channel
//!
//! The socket's write half lives in its own task; everyone else queues frames here.

use super::resume::SequenceCell;
use crate::error::{GatewayError, GatewayResult};
use crate::heartbeat::HeartbeatSink;
use crate::protocol::FrameCodec;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Cloneable handle to the socket writer
#[derive(Debug, Clone)]
pub struct FrameSender {
    tx: mpsc::UnboundedSender<Message>,
}

impl FrameSender {
    /// Create a sender and the receiver drained by the writer task
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a text frame
    pub fn send_text(&self, text: String) -> GatewayResult<()> {
        self.tx
            .send(Message::Text(text.into()))
            .map_err(|_| GatewayError::SocketClosed)
    }

    /// Queue a close frame; the writer stops after sending it
    pub fn close(&self) -> GatewayResult<()> {
        self.tx
            .send(Message::Close(None))
            .map_err(|_| GatewayError::SocketClosed)
    }

    /// Check if the writer has gone away
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Heartbeat frames for one connection
#[derive(Debug)]
pub(crate) struct HeartbeatFrames {
    sender: FrameSender,
    /// Present only when resume is enabled
    sequence: Option<SequenceCell>,
}

impl HeartbeatFrames {
    pub(crate) fn new(sender: FrameSender, sequence: Option<SequenceCell>) -> Self {
        Self { sender, sequence }
    }
}

impl HeartbeatSink for HeartbeatFrames {
    fn send_heartbeat(&self) -> GatewayResult<()> {
        let last = self.sequence.as_ref().and_then(SequenceCell::get);
        self.sender.send_text(FrameCodec::encode_heartbeat(last))
    }
}
