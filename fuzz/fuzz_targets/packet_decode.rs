//! Fuzz target for packet decoding
//!
//! Tests that the wire codec handles arbitrary payload text without
//! panicking, only returning Ok or Err.

#![no_main]

use earshot_core::Packet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(packet) = Packet::decode(data) {
        // Anything that decodes must re-encode to a decodable line.
        let line = packet.encode();
        assert!(Packet::decode(&line).is_ok());
    }
});
