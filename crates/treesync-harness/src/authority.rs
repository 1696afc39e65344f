//! Scripted remote authority.
//!
//! Stands in for the server side of a session. It reads the frames a client
//! transport produced, records every decoded client message, and encodes
//! whatever server messages the test scripts.

use bytes::Bytes;
use tokio::sync::mpsc;
use treesync_proto::{
    ClientMessage, EventMessage, Hello, HelloResponse, ProtocolError, ServerMessage, WireMessage,
};

/// Authority side of one client session.
#[derive(Debug)]
pub struct SimAuthority {
    inbox: mpsc::UnboundedReceiver<Bytes>,
    session_id: String,
    server_version: String,
    debug: Vec<String>,
    received: Vec<ClientMessage>,
    undecodable: usize,
}

impl SimAuthority {
    /// Authority reading client frames from `inbox`.
    pub fn new(inbox: mpsc::UnboundedReceiver<Bytes>, session_id: impl Into<String>) -> Self {
        Self {
            inbox,
            session_id: session_id.into(),
            server_version: "2.0".to_string(),
            debug: Vec::new(),
            received: Vec::new(),
            undecodable: 0,
        }
    }

    /// Version reported in `HelloResponse`.
    pub fn with_server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = version.into();
        self
    }

    /// Diagnostic categories to enable on the client.
    pub fn with_debug<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.debug = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Read every frame the client has sent since the last poll.
    ///
    /// Returns the newly decoded messages. Undecodable frames are counted
    /// and skipped.
    pub fn poll(&mut self) -> Vec<ClientMessage> {
        let mut fresh = Vec::new();
        while let Ok(frame) = self.inbox.try_recv() {
            match ClientMessage::decode(&frame) {
                Ok(message) => {
                    tracing::trace!(kind = message.kind(), "authority received");
                    fresh.push(message);
                },
                Err(error) => {
                    tracing::warn!(%error, "authority received undecodable frame");
                    self.undecodable += 1;
                },
            }
        }
        self.received.extend(fresh.iter().cloned());
        fresh
    }

    /// Handshake reply for this session.
    pub fn hello_response(&self) -> HelloResponse {
        HelloResponse {
            session_id: self.session_id.clone(),
            server_version: self.server_version.clone(),
            debug: self.debug.clone(),
        }
    }

    /// Encoded handshake reply.
    pub fn hello_response_frame(&self) -> Result<Bytes, ProtocolError> {
        ServerMessage::HelloResponse(self.hello_response()).encode()
    }

    /// Encode a scripted message.
    pub fn frame(message: &ServerMessage) -> Result<Bytes, ProtocolError> {
        message.encode()
    }

    /// Session id this authority assigns.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Every message received so far, in order.
    pub fn received(&self) -> &[ClientMessage] {
        &self.received
    }

    /// Frames that failed to decode.
    pub fn undecodable(&self) -> usize {
        self.undecodable
    }

    /// Received `Hello` messages.
    pub fn hellos(&self) -> Vec<&Hello> {
        self.received
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Hello(hello) => Some(hello),
                _ => None,
            })
            .collect()
    }

    /// Received events.
    pub fn events(&self) -> Vec<&EventMessage> {
        self.received
            .iter()
            .filter_map(|m| match m {
                ClientMessage::Event(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    /// Paths reported through `PathChanged`.
    pub fn reported_paths(&self) -> Vec<&str> {
        self.received
            .iter()
            .filter_map(|m| match m {
                ClientMessage::PathChanged { path } => Some(path.as_str()),
                _ => None,
            })
            .collect()
    }
}
