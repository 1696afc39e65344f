//! CBOR encoding of wire messages.
//!
//! The encoding is a transport policy: the protocol only needs something that
//! round-trips the message shapes. Every transport in this workspace uses the
//! helpers here so the authority sees the same bytes regardless of channel.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    errors::{ProtocolError, Result},
    messages::{ClientMessage, ServerMessage},
};

/// Maximum size of one encoded message (16 MB).
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// A message that can be put on the wire.
pub trait WireMessage: Serialize + DeserializeOwned {
    /// Encode to CBOR.
    ///
    /// # Errors
    ///
    /// - `Encode` if serialization fails
    /// - `PayloadTooLarge` if the result exceeds [`MAX_MESSAGE_SIZE`]
    fn encode(&self) -> Result<Bytes> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| ProtocolError::Encode(e.to_string()))?;

        if buf.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::PayloadTooLarge { size: buf.len(), max: MAX_MESSAGE_SIZE });
        }

        Ok(Bytes::from(buf))
    }

    /// Decode from CBOR.
    ///
    /// The size check runs before any parsing.
    ///
    /// # Errors
    ///
    /// - `Empty` for a zero-length buffer
    /// - `PayloadTooLarge` if the buffer exceeds [`MAX_MESSAGE_SIZE`]
    /// - `Decode` if the bytes are not a valid message
    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ProtocolError::Empty);
        }

        if bytes.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::PayloadTooLarge { size: bytes.len(), max: MAX_MESSAGE_SIZE });
        }

        ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

impl WireMessage for ClientMessage {}
impl WireMessage for ServerMessage {}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::{
        Capabilities, ColorScheme, ErrorContext, Hello, HelloResponse, Patch, PropValue,
        RemoteError, SerializedElement, Value,
    };

    #[test]
    fn path_changed_wire_bytes() {
        let msg = ClientMessage::PathChanged { path: "/".into() };
        let bytes = msg.encode().unwrap();

        // {"type": "path_changed", "path": "/"}
        let expected = hex!("A2 64 74797065 6C 706174685F6368616E676564 64 70617468 61 2F");
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn hello_survives_the_wire() {
        let msg = ClientMessage::Hello(Hello {
            client_id: "web".into(),
            protocol_version: crate::PROTOCOL_VERSION,
            color_scheme: ColorScheme::Dark,
            locale: Some("en-GB".into()),
            capabilities: Capabilities::standard(),
            initial_path: None,
        });

        let decoded = ClientMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn patch_batch_with_deletion_marker() {
        let msg = ServerMessage::PatchBatch {
            patches: vec![
                Patch::update_props("e1", [("gone", None), ("text", Some(PropValue::from("Bye")))]),
                Patch::Add {
                    parent_id: Some("root".into()),
                    child_order: vec!["e1".into(), "e2".into()],
                    subtree: SerializedElement::element("button")
                        .with_key("e2")
                        .with_prop("on_click", PropValue::callback("cb-7")),
                },
                Patch::remove("e0"),
            ],
        };

        let decoded = ServerMessage::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn explicit_null_is_not_the_deletion_marker() {
        let msg = ServerMessage::PatchBatch {
            patches: vec![Patch::update_props("e1", [("v", Some(PropValue::Value(Value::Null)))])],
        };

        let decoded = ServerMessage::decode(&msg.encode().unwrap()).unwrap();
        let ServerMessage::PatchBatch { patches } = decoded else {
            unreachable!("expected patch batch");
        };
        let Patch::Update { props: Some(props), .. } = &patches[0] else {
            unreachable!("expected update");
        };
        assert_eq!(props.get("v"), Some(&Some(PropValue::Value(Value::Null))));
    }

    #[test]
    fn unknown_discriminant_decodes_to_unknown() {
        let mut buf = Vec::new();
        let value = Value::Map(vec![
            (Value::Text("type".into()), Value::Text("telemetry_v9".into())),
            (Value::Text("sample".into()), Value::Integer(4.into())),
        ]);
        ciborium::ser::into_writer(&value, &mut buf).unwrap();

        assert_eq!(ServerMessage::decode(&buf).unwrap(), ServerMessage::Unknown);
    }

    #[test]
    fn server_messages_survive_the_wire() {
        let messages = vec![
            ServerMessage::HelloResponse(HelloResponse {
                session_id: "s1".into(),
                server_version: "2.0".into(),
                debug: vec!["patches".into()],
            }),
            ServerMessage::Error(RemoteError {
                message: "boom".into(),
                context: ErrorContext::Callback,
            }),
            ServerMessage::PushPath { path: "/settings".into() },
            ServerMessage::GoBack,
            ServerMessage::Reload,
        ];

        for msg in messages {
            assert_eq!(ServerMessage::decode(&msg.encode().unwrap()).unwrap(), msg);
        }
    }

    #[test]
    fn empty_buffer_rejected() {
        assert_eq!(ServerMessage::decode(&[]), Err(ProtocolError::Empty));
    }

    #[test]
    fn oversized_buffer_rejected_before_parsing() {
        let buf = vec![0u8; MAX_MESSAGE_SIZE + 1];
        assert!(matches!(
            ServerMessage::decode(&buf),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(ServerMessage::decode(&[0xFF, 0x00, 0x13]), Err(ProtocolError::Decode(_))));
    }
}
