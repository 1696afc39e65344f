//! Host-runtime channel transport.

use bytes::Bytes;
use treesync_core::{RoutingMode, Transport};
use treesync_proto::{ClientMessage, ServerMessage, WireMessage};

use super::{Hosting, TransportError};

/// Bidirectional named channels provided by a host runtime.
///
/// Inbound payloads are delivered by the host to whatever it was told to
/// call; this trait only covers the outbound side and registration.
pub trait HostRuntime: Send {
    /// Register a channel. Must succeed before anything is posted on it.
    fn register(&mut self, channel: &str) -> Result<(), String>;

    /// Post one payload on a registered channel.
    fn post(&mut self, channel: &str, payload: Bytes) -> Result<(), String>;

    /// Release a channel.
    fn unregister(&mut self, channel: &str);
}

/// Transport over a host runtime channel.
///
/// Registration is the out-of-band step: it happens in `open`, before the
/// client sends `Hello`.
#[derive(Debug)]
pub struct HostChannelTransport<H> {
    host: H,
    channel: String,
    hosting: Hosting,
    registered: bool,
}

impl<H: HostRuntime> HostChannelTransport<H> {
    /// Transport on `channel`.
    pub fn new(host: H, channel: impl Into<String>, hosting: Hosting) -> Self {
        Self { host, channel: channel.into(), hosting, registered: false }
    }

    /// Channel name.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the channel is registered with the host.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Host runtime.
    pub fn host(&self) -> &H {
        &self.host
    }

    fn host_error(&self, reason: String) -> TransportError {
        TransportError::Host { channel: self.channel.clone(), reason }
    }
}

impl<H: HostRuntime> Transport for HostChannelTransport<H> {
    type Payload = Bytes;
    type Error = TransportError;

    fn open(&mut self) -> Result<(), TransportError> {
        if self.registered {
            return Ok(());
        }
        self.host.register(&self.channel).map_err(|reason| self.host_error(reason))?;
        self.registered = true;

        tracing::debug!(channel = %self.channel, "host channel registered");
        Ok(())
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        if !self.registered {
            return Err(TransportError::NotOpen);
        }
        let payload = message.encode()?;
        self.host.post(&self.channel, payload).map_err(|reason| self.host_error(reason))
    }

    fn decode(&self, payload: Bytes) -> Result<ServerMessage, TransportError> {
        Ok(ServerMessage::decode(&payload)?)
    }

    fn close(&mut self) {
        if self.registered {
            self.host.unregister(&self.channel);
            self.registered = false;
        }
    }

    fn default_routing(&self) -> RoutingMode {
        self.hosting.default_routing()
    }
}
