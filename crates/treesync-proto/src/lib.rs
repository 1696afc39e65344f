//! Wire format for the treesync protocol.
//!
//! A remote authority renders a UI tree and streams it to a local
//! presentation layer. This crate defines the closed set of messages both
//! sides exchange and the compact binary encoding they travel in.
//!
//! Messages are CBOR maps internally tagged by a `type` field. Any message
//! whose discriminant is not known to this version decodes to an `Unknown`
//! variant instead of failing, so the authority can add message kinds without
//! breaking older clients.
//!
//! # Data model
//!
//! - [`SerializedElement`]: the tree as the authority renders it
//! - [`Patch`]: one incremental mutation of the mirrored tree
//! - [`PropValue`]: a prop is a plain value, a callback reference, or a
//!   two-way binding. Nothing downstream has to sniff runtime types.
//!
//! # Security
//!
//! Decoding enforces a 16 MB limit on message size before any parsing is
//! attempted.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capabilities;
pub mod codec;
pub mod element;
pub mod errors;
pub mod messages;
pub mod patch;

pub use capabilities::Capabilities;
pub use ciborium::Value;
pub use codec::{MAX_MESSAGE_SIZE, WireMessage};
pub use element::{Binding, CallbackRef, ElementKind, NodeId, PropValue, Props, SerializedElement};
pub use errors::{ProtocolError, Result};
pub use messages::{
    ClientMessage, ColorScheme, ErrorContext, EventMessage, Hello, HelloResponse,
    PROTOCOL_VERSION, RemoteError, ServerMessage,
};
pub use patch::{Patch, PropsDelta};
