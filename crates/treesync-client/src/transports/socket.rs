//! Socket transport: one encoded message per frame.

use bytes::Bytes;
use tokio::sync::mpsc;
use treesync_core::{RoutingMode, Transport};
use treesync_proto::{ClientMessage, ServerMessage, WireMessage};

use super::{Hosting, TransportError};

/// Writes each message as one frame to an outbound frame channel.
///
/// Whatever owns the socket drains the receiving half and writes frames in
/// order; inbound frames are handed to `Client::receive` as they arrive.
#[derive(Debug)]
pub struct SocketTransport {
    frames: mpsc::UnboundedSender<Bytes>,
    hosting: Hosting,
    open: bool,
}

impl SocketTransport {
    /// Transport writing to `frames`.
    pub fn new(frames: mpsc::UnboundedSender<Bytes>, hosting: Hosting) -> Self {
        Self { frames, hosting, open: false }
    }

    /// Transport plus the receiving half of its frame channel.
    pub fn channel(hosting: Hosting) -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx, hosting), rx)
    }

    /// Whether `open` has been called and `close` has not.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Transport for SocketTransport {
    type Payload = Bytes;
    type Error = TransportError;

    fn open(&mut self) -> Result<(), TransportError> {
        if self.frames.is_closed() {
            return Err(TransportError::Closed);
        }
        self.open = true;
        Ok(())
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen);
        }
        let frame = message.encode()?;
        tracing::trace!(kind = message.kind(), size = frame.len(), "socket frame out");
        self.frames.send(frame).map_err(|_| TransportError::Closed)
    }

    fn decode(&self, payload: Bytes) -> Result<ServerMessage, TransportError> {
        Ok(ServerMessage::decode(&payload)?)
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn default_routing(&self) -> RoutingMode {
        self.hosting.default_routing()
    }
}
