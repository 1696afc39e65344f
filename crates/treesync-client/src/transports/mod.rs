//! Transport adapters.
//!
//! Each adapter differs from the others only in how the channel is opened,
//! what the native payload is, and which routing mode it picks by default.
//! All of them carry one CBOR-encoded message per payload.
//!
//! - [`SocketTransport`]: one message per frame on a socket-like stream
//! - [`WorkerTransport`]: in-process worker channel, queues until the remote
//!   side attaches
//! - [`HostChannelTransport`]: named channel provided by the host runtime,
//!   registered before the first message

mod host;
mod socket;
mod worker;

pub use host::{HostChannelTransport, HostRuntime};
pub use socket::SocketTransport;
use thiserror::Error;
use treesync_core::RoutingMode;
use treesync_proto::ProtocolError;
pub use worker::{RemoteHandler, WorkerPort, WorkerTransport};

/// Where the presentation layer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Hosting {
    /// Inside a browser, with an address bar and native history.
    Browser,
    /// Headless or embedded, nothing visible to address.
    #[default]
    Headless,
}

impl Hosting {
    /// Routing discipline suited to this host.
    pub fn default_routing(self) -> RoutingMode {
        match self {
            Self::Browser => RoutingMode::Fragment,
            Self::Headless => RoutingMode::Hidden,
        }
    }
}

/// Errors shared by the bundled transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The channel was closed, locally or by the remote side.
    #[error("channel closed")]
    Closed,

    /// A message was sent before `open`.
    #[error("channel not open")]
    NotOpen,

    /// Encoding or decoding failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The host runtime rejected a call.
    #[error("host channel {channel}: {reason}")]
    Host {
        /// Channel name.
        channel: String,
        /// Host's description.
        reason: String,
    },
}
