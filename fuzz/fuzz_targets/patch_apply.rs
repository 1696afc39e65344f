#![no_main]

use libfuzzer_sys::fuzz_target;
use treesync_core::TreeStore;
use treesync_proto::{SerializedElement, ServerMessage, WireMessage};

fn seed() -> SerializedElement {
    SerializedElement::component("App")
        .with_key("root")
        .with_child(
            SerializedElement::element("div")
                .with_key("a")
                .with_child(SerializedElement::text("hello").with_key("t")),
        )
        .with_child(SerializedElement::element("div").with_key("b"))
}

fuzz_target!(|data: &[u8]| {
    let mut store = TreeStore::new();
    let _ = store.set_tree(&seed()).fire();

    match ServerMessage::decode(data) {
        Ok(ServerMessage::Render { root }) => {
            let _ = store.set_tree(&root).fire();
        },
        Ok(ServerMessage::PatchBatch { patches }) => {
            let _ = store.apply_patches(&patches).fire();
        },
        _ => return,
    }

    if let Some(root) = store.root_id() {
        assert!(store.contains(root.as_str()), "root id points at a missing node");
    }
    for (id, _) in store.nodes() {
        assert!(store.node(id.as_str()).is_some());
    }
});
