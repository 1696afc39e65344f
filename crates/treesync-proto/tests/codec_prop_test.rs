//! Property tests for the wire codec.
//!
//! Generated messages of every shape must decode to themselves, and decoding
//! arbitrary bytes must fail cleanly rather than panic.

use proptest::prelude::*;
use treesync_proto::{
    Binding, CallbackRef, Capabilities, ClientMessage, ColorScheme, ErrorContext, EventMessage,
    Hello, HelloResponse, NodeId, PROTOCOL_VERSION, Patch, PropValue, PropsDelta, RemoteError,
    SerializedElement, ServerMessage, Value, WireMessage,
};

fn node_id() -> impl Strategy<Value = NodeId> {
    "[a-z][a-z0-9]{0,5}".prop_map(NodeId::from)
}

fn plain_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,12}".prop_map(Value::Text),
        any::<i64>().prop_map(|n| Value::Integer(n.into())),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

fn prop_value() -> impl Strategy<Value = PropValue> {
    prop_oneof![
        3 => plain_value().prop_map(PropValue::Value),
        1 => "cb-[0-9]{1,3}".prop_map(|id| PropValue::Callback(CallbackRef { id })),
        1 => ("[a-z]{1,6}", plain_value())
            .prop_map(|(reference, value)| PropValue::Binding(Binding { reference, value })),
    ]
}

fn element() -> impl Strategy<Value = SerializedElement> {
    let leaf = (
        prop_oneof![
            "[A-Z][a-z]{0,6}".prop_map(SerializedElement::component),
            "[a-z]{1,6}".prop_map(SerializedElement::element),
            "[ -~]{0,10}".prop_map(SerializedElement::text),
        ],
        prop::option::of(node_id()),
        prop::collection::btree_map("[a-z_]{1,8}", prop_value(), 0..4),
    )
        .prop_map(|(mut element, key, props)| {
            element.key = key;
            element.props.extend(props);
            element
        });

    leaf.prop_recursive(3, 24, 4, |inner| {
        (inner.clone(), prop::collection::vec(inner, 0..4)).prop_map(|(mut parent, children)| {
            parent.children = children;
            parent
        })
    })
}

fn props_delta() -> impl Strategy<Value = PropsDelta> {
    prop::collection::btree_map("[a-z_]{1,8}", prop::option::of(prop_value()), 0..4)
}

fn patch() -> impl Strategy<Value = Patch> {
    prop_oneof![
        (prop::option::of(node_id()), prop::collection::vec(node_id(), 0..4), element()).prop_map(
            |(parent_id, child_order, subtree)| Patch::Add { parent_id, child_order, subtree }
        ),
        (
            node_id(),
            prop::option::of(props_delta()),
            prop::option::of(prop::collection::vec(node_id(), 0..4)),
        )
            .prop_map(|(id, props, child_order)| Patch::Update { id, props, child_order }),
        node_id().prop_map(|id| Patch::Remove { id }),
    ]
}

fn server_message() -> impl Strategy<Value = ServerMessage> {
    prop_oneof![
        ("s[0-9]{1,4}", "[0-9]\\.[0-9]", prop::collection::vec("[a-z]{1,8}", 0..3)).prop_map(
            |(session_id, server_version, debug)| {
                ServerMessage::HelloResponse(HelloResponse { session_id, server_version, debug })
            }
        ),
        element().prop_map(|root| ServerMessage::Render { root }),
        prop::collection::vec(patch(), 0..6).prop_map(|patches| ServerMessage::PatchBatch { patches }),
        ("[ -~]{0,20}", prop_oneof![Just(ErrorContext::Render), Just(ErrorContext::Callback)])
            .prop_map(|(message, context)| ServerMessage::Error(RemoteError { message, context })),
        "/[a-z/]{0,10}".prop_map(|path| ServerMessage::PushPath { path }),
        Just(ServerMessage::GoBack),
        Just(ServerMessage::GoForward),
        Just(ServerMessage::Reload),
    ]
}

fn client_message() -> impl Strategy<Value = ClientMessage> {
    prop_oneof![
        (
            "[a-z-]{1,10}",
            prop_oneof![Just(ColorScheme::Light), Just(ColorScheme::Dark)],
            prop::option::of("[a-z]{2}-[A-Z]{2}"),
            prop::option::of("/[a-z/]{0,10}"),
        )
            .prop_map(|(client_id, color_scheme, locale, initial_path)| {
                ClientMessage::Hello(Hello {
                    client_id,
                    protocol_version: PROTOCOL_VERSION,
                    color_scheme,
                    locale,
                    capabilities: Capabilities::standard(),
                    initial_path,
                })
            }),
        ("cb-[0-9]{1,3}", prop::collection::vec(plain_value(), 0..4)).prop_map(
            |(callback_id, args)| ClientMessage::Event(EventMessage { callback_id, args })
        ),
        "/[a-z/]{0,10}".prop_map(|path| ClientMessage::PathChanged { path }),
    ]
}

proptest! {
    #[test]
    fn prop_server_messages_survive_the_wire(message in server_message()) {
        let bytes = message.encode().expect("encode");
        prop_assert_eq!(ServerMessage::decode(&bytes).expect("decode"), message);
    }

    #[test]
    fn prop_client_messages_survive_the_wire(message in client_message()) {
        let bytes = message.encode().expect("encode");
        prop_assert_eq!(ClientMessage::decode(&bytes).expect("decode"), message);
    }

    #[test]
    fn prop_arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = ServerMessage::decode(&bytes);
        let _ = ClientMessage::decode(&bytes);
    }

    #[test]
    fn prop_truncated_messages_are_rejected(
        message in server_message(),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = message.encode().expect("encode");
        let len = cut.index(bytes.len());
        prop_assert!(ServerMessage::decode(&bytes[..len]).is_err());
    }
}
