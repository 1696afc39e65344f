//! Transport abstraction for duplex message channels.
//!
//! The client core never touches sockets, workers or host channels. A
//! transport tells it how messages move: how the channel is opened, how a
//! message becomes the channel's native payload and back, and which routing
//! discipline suits the deployment.
//!
//! A conforming transport preserves message order in each direction. The
//! core does not re-derive ordering.

use treesync_proto::{ClientMessage, ServerMessage};

use crate::routing::RoutingMode;

/// A duplex message channel to the remote authority.
///
/// Inbound payloads are pushed into the client by whatever drives the
/// transport (its single delivery callback); the client calls
/// [`decode`](Self::decode) on each.
pub trait Transport: Send {
    /// Native payload type of the channel.
    type Payload;

    /// Channel-level error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the channel. Anything out of band the channel needs (such as
    /// registering with the host) happens here, before the first message.
    fn open(&mut self) -> Result<(), Self::Error>;

    /// Encode and send one message.
    fn send(&mut self, message: &ClientMessage) -> Result<(), Self::Error>;

    /// Decode one inbound payload.
    fn decode(&self, payload: Self::Payload) -> Result<ServerMessage, Self::Error>;

    /// Close the channel. Idempotent.
    fn close(&mut self);

    /// Routing discipline to use when the caller does not choose one.
    fn default_routing(&self) -> RoutingMode;
}
