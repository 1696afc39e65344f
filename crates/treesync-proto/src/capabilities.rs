//! Protocol capability flags advertised by the client in `Hello`.

use bitflags::bitflags;

bitflags! {
    /// Features the client is able to handle.
    ///
    /// On the wire the flags travel as their raw `u32` bits. Unknown bits
    /// sent by a newer peer are dropped on decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Client applies incremental patch batches. Without it the authority
        /// must send a full render for every change.
        const PATCHES = 0b0000_0001;
        /// Client honours navigation messages (push path, back, forward).
        const NAVIGATION = 0b0000_0010;
        /// Client understands mutable-binding props.
        const BINDINGS = 0b0000_0100;
        /// Client keeps its own history list (hidden routing).
        const HIDDEN_ROUTING = 0b0000_1000;
        /// Client can execute a reload request.
        const RELOAD = 0b0001_0000;
    }
}

impl Capabilities {
    /// Flags every client built from this crate supports.
    pub const fn standard() -> Self {
        Self::PATCHES.union(Self::NAVIGATION).union(Self::BINDINGS).union(Self::RELOAD)
    }
}

/// Serde adapter storing [`Capabilities`] as plain bits.
///
/// Internally tagged messages are buffered before deserialization, which
/// loses the format's human-readable hint, so the flags must not depend on it.
pub mod bits {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Capabilities;

    /// Serialize as `u32`.
    pub fn serialize<S: Serializer>(
        flags: &Capabilities,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(flags.bits())
    }

    /// Deserialize from `u32`, dropping unknown bits.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Capabilities, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Capabilities::from_bits_truncate(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_excludes_hidden_routing() {
        let caps = Capabilities::standard();
        assert!(caps.contains(Capabilities::PATCHES));
        assert!(caps.contains(Capabilities::NAVIGATION));
        assert!(!caps.contains(Capabilities::HIDDEN_ROUTING));
    }

    #[test]
    fn unknown_bits_are_truncated() {
        let caps = Capabilities::from_bits_truncate(0xFFFF_0001);
        assert_eq!(caps, Capabilities::PATCHES);
    }
}
