//! treesync client
//!
//! Mirrors a UI tree rendered by a remote authority and keeps it current
//! over any duplex message channel.
//!
//! # Components
//!
//! - [`Client`]: Composes store, session and routing over one [`Transport`]
//! - [`Connecting`]: Resolves once when the handshake ends
//! - [`ClientConfig`]: Handshake environment, routing and event policy
//! - [`ViewState`] / [`ClientAction`]: What the host should present and do
//! - [`transports`]: Socket, worker and host-channel adapters
//!
//! # Example
//!
//! ```
//! use std::time::Instant;
//!
//! use treesync_client::{Client, ClientConfig, transports::WorkerTransport};
//! use treesync_core::StoreHandle;
//!
//! let (transport, _port) = WorkerTransport::pair();
//! let mut client = Client::new(transport, StoreHandle::new(), None, ClientConfig::default())?;
//! let _connecting = client.connect(Instant::now())?;
//! # Ok::<(), treesync_client::ClientError>(())
//! ```

mod client;
mod config;
mod connecting;
mod error;
pub mod transports;
mod view;

pub use client::Client;
pub use config::{ClientConfig, EventPolicy};
pub use connecting::Connecting;
pub use error::{ClientError, ConnectError};
pub use treesync_core::Transport;
pub use view::{ClientAction, ViewState};
