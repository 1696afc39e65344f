//! Error types for the client core.

use thiserror::Error;

use crate::{connection::ConnectionState, routing::RoutingMode};

/// Session state machine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Operation not valid in the current state.
    #[error("invalid operation {operation} in state {state:?}")]
    InvalidState {
        /// State the machine was in.
        state: ConnectionState,
        /// Operation that was attempted.
        operation: &'static str,
    },
}

/// Routing manager construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The mode reads and writes a platform address but none was supplied.
    #[error("routing mode {0:?} requires a history platform")]
    PlatformRequired(RoutingMode),
}
