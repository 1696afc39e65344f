//! treesync client core logic
//!
//! Pure state machines for mirroring a remotely rendered UI tree, decoupled
//! from I/O. Time is passed in by the caller and nothing here opens a socket
//! or registers a platform listener on its own.
//!
//! # Architecture
//!
//! A transport delivers decoded messages to a client, which forwards them to
//! the [`connection`] state machine and, once the handshake is done, to the
//! [`store`]. The store mutates its node map and notifies exactly the
//! listeners whose node was affected. The [`routing`] manager keeps the
//! presented location in one of three disciplines behind one contract.
//!
//! # Components
//!
//! - [`store`]: ID-keyed node map, patch application, subscriptions
//! - [`connection`]: Session state machine (handshake, timeout, close)
//! - [`routing`]: History, fragment and hidden addressing
//! - [`transport`]: Transport abstraction (duplex message channel)
//! - [`error`]: Error types

pub mod connection;
pub mod error;
pub mod routing;
pub mod store;
pub mod transport;

pub use connection::{
    CloseReason, Connection, ConnectionAction, ConnectionConfig, ConnectionState, Session,
};
pub use error::{ConnectionError, RoutingError};
pub use routing::{HistoryPlatform, ListenerToken, PlatformSignal, Router, RoutingMode};
pub use store::{
    Diagnostic, NodeData, PendingNotifications, StoreHandle, SubscriptionId, TreeStore,
};
pub use transport::Transport;
