//! Session state machine.
//!
//! Tracks the lifecycle of one connection to the remote authority and gates
//! tree messages until the handshake has completed.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods accept time as parameter (no stored clock)
//! - Methods return `Result<Vec<ConnectionAction>, ConnectionError>`
//! - The client executes actions (send the message, close the transport)
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect ┌────────────┐ HelloResponse ┌───────────┐
//! │ Disconnected │────────>│ Connecting │──────────────>│ Connected │
//! └──────────────┘         └────────────┘               └───────────┘
//!        ^                       │ timeout / close            │ close
//!        └───────────────────────┴────────────────────────────┘
//! ```
//!
//! `Disconnected` is both the initial state and the state every close lands
//! in. Closing is idempotent: only the first close after a connect reports a
//! transition, so callbacks tied to it fire once.
//!
//! # Timeouts
//!
//! - **Handshake timeout**: 10 seconds from `Hello` to `HelloResponse`

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use treesync_proto::{ClientMessage, Hello, HelloResponse};

use crate::error::ConnectionError;

/// Actions returned by the session state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAction {
    /// Encode and send this message over the transport.
    SendMessage(ClientMessage),

    /// Close the transport.
    Close {
        /// Why the connection is being closed.
        reason: CloseReason,
    },
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloseReason {
    /// `HelloResponse` did not arrive in time.
    #[error("handshake timed out after {elapsed:?}")]
    HandshakeTimeout {
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The transport failed or closed underneath us.
    #[error("transport failure: {0}")]
    Transport(String),

    /// An inbound payload could not be decoded.
    #[error("undecodable message: {0}")]
    Decode(String),

    /// Local disconnect.
    #[error("closed by client")]
    Local,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No transport session. Initial and terminal state.
    Disconnected,
    /// `Hello` sent, waiting for `HelloResponse`.
    Connecting,
    /// Handshake complete.
    Connected,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Timeout for completing the handshake
    #[serde(with = "millis")]
    pub handshake_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self { handshake_timeout: Duration::from_secs(10) }
    }
}

/// Session identity recorded at handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque id assigned by the authority.
    pub session_id: String,
    /// Informational authority version.
    pub server_version: String,
    /// Diagnostic categories with verbose tracing enabled.
    pub debug: Vec<String>,
}

impl Session {
    /// Whether verbose tracing is enabled for a category.
    pub fn traces(&self, category: &str) -> bool {
        self.debug.iter().any(|c| c == category || c == "*")
    }
}

impl From<&HelloResponse> for Session {
    fn from(response: &HelloResponse) -> Self {
        Self {
            session_id: response.session_id.clone(),
            server_version: response.server_version.clone(),
            debug: response.debug.clone(),
        }
    }
}

/// Session state machine
///
/// This is a pure state machine - no I/O, no clock.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    config: ConnectionConfig,
    /// When `Hello` was sent
    hello_sent_at: Option<Instant>,
    /// Identity assigned by the authority
    session: Option<Session>,
}

impl Connection {
    /// Create a new connection in `Disconnected` state
    pub fn new(config: ConnectionConfig) -> Self {
        Self { state: ConnectionState::Disconnected, config, hello_sent_at: None, session: None }
    }

    /// Get current state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the handshake has completed
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Session recorded by the last successful handshake
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Configuration in use
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Start the handshake.
    ///
    /// Moves `Disconnected` to `Connecting` and returns the `Hello` to send.
    /// Any session from a previous connection is forgotten.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless disconnected
    pub fn connect(
        &mut self,
        hello: Hello,
        now: Instant,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.state != ConnectionState::Disconnected {
            return Err(ConnectionError::InvalidState { state: self.state, operation: "connect" });
        }

        self.state = ConnectionState::Connecting;
        self.hello_sent_at = Some(now);
        self.session = None;

        tracing::debug!(client_id = %hello.client_id, "handshake started");
        Ok(vec![ConnectionAction::SendMessage(ClientMessage::Hello(hello))])
    }

    /// Complete the handshake.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless connecting
    pub fn receive_hello_response(
        &mut self,
        response: &HelloResponse,
    ) -> Result<&Session, ConnectionError> {
        if self.state != ConnectionState::Connecting {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "receive_hello_response",
            });
        }

        self.state = ConnectionState::Connected;
        self.hello_sent_at = None;

        tracing::debug!(
            session_id = %response.session_id,
            server_version = %response.server_version,
            "handshake complete"
        );
        Ok(&*self.session.insert(Session::from(response)))
    }

    /// Move to `Disconnected`.
    ///
    /// Returns `true` if this call changed the state. Repeated closes return
    /// `false` so their side effects run once.
    pub fn close(&mut self, reason: &CloseReason) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }

        tracing::debug!(from = ?self.state, %reason, "connection closed");
        self.state = ConnectionState::Disconnected;
        self.hello_sent_at = None;
        true
    }

    /// Check if the handshake has timed out
    ///
    /// # Returns
    /// `Some(elapsed)` if timed out, `None` otherwise
    pub fn check_timeout(&self, now: Instant) -> Option<Duration> {
        if self.state != ConnectionState::Connecting {
            return None;
        }

        let sent = self.hello_sent_at?;
        let elapsed = now.saturating_duration_since(sent);
        if elapsed > self.config.handshake_timeout { Some(elapsed) } else { None }
    }

    /// Tick the state machine
    ///
    /// Call periodically while connecting. Returns a `Close` action once the
    /// handshake timeout has passed.
    pub fn tick(&mut self, now: Instant) -> Vec<ConnectionAction> {
        let Some(elapsed) = self.check_timeout(now) else {
            return Vec::new();
        };

        let reason = CloseReason::HandshakeTimeout { elapsed };
        self.close(&reason);
        vec![ConnectionAction::Close { reason }]
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
