//! Error types for the client.

use std::time::Duration;

use thiserror::Error;
use treesync_core::{ConnectionError, RoutingError};
use treesync_proto::ProtocolError;

/// Errors from client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Session state machine rejected the operation.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Routing manager could not be built.
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    /// A message could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The transport failed. The client is disconnected afterwards.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    pub(crate) fn transport<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(error))
    }
}

/// Why a pending connect did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// No `HelloResponse` within the handshake timeout.
    #[error("handshake timed out after {elapsed:?}")]
    HandshakeTimeout {
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The transport failed or closed during the handshake.
    #[error("transport failed during handshake: {0}")]
    Transport(String),

    /// `disconnect` was called before the handshake completed.
    #[error("disconnected before handshake completed")]
    Disconnected,

    /// The client was dropped or a newer connect superseded this one.
    #[error("client dropped before handshake completed")]
    Dropped,
}
