#![no_main]

use libfuzzer_sys::fuzz_target;
use treesync_proto::{ClientMessage, ServerMessage, WireMessage};

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = ServerMessage::decode(data) {
        let encoded = message.encode().expect("decoded message re-encodes");
        ServerMessage::decode(&encoded).expect("re-encoded message decodes");
    }

    if let Ok(message) = ClientMessage::decode(data) {
        let encoded = message.encode().expect("decoded message re-encodes");
        ClientMessage::decode(&encoded).expect("re-encoded message decodes");
    }
});
