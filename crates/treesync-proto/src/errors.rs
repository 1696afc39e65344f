//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding wire messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Message exceeds [`crate::MAX_MESSAGE_SIZE`].
    #[error("message too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Encoded size in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        max: usize,
    },

    /// Empty buffer where a message was expected.
    #[error("empty message buffer")]
    Empty,

    /// CBOR serialization failed.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// CBOR deserialization failed or the shape did not match any message.
    #[error("failed to decode message: {0}")]
    Decode(String),
}
