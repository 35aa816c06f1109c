//! Fuzz target for InboundMessage::decode
//!
//! Feeds arbitrary text to the inbound decoder to find:
//! - Parser panics on malformed or deeply nested JSON
//! - Frames that decode but fail to re-encode
//! - Encodings that do not decode back to the same message
//!
//! The fuzzer should NEVER panic. Invalid frames must return an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mindlink_proto::InboundMessage;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(msg) = InboundMessage::decode(frame) else {
        return;
    };

    let encoded = msg.encode().expect("decoded message must re-encode");
    let decoded = InboundMessage::decode(&encoded).expect("encoding must decode");
    assert_eq!(decoded, msg);
});
