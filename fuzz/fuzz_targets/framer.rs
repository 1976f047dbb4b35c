//! Fuzz target for chunk reassembly
//!
//! Tests that the framer handles arbitrary chunk streams without panicking
//! and never emits a partial or empty payload.

#![no_main]

use arbitrary::Arbitrary;
use earshot_core::ChunkFramer;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct FramerInput {
    chunks: Vec<Vec<u8>>,
}

fuzz_target!(|input: FramerInput| {
    let mut framer = ChunkFramer::new();

    for chunk in &input.chunks {
        for payload in framer.feed(chunk) {
            // Emitted payloads are complete: no delimiter, no surrounding
            // whitespace, never empty.
            assert!(!payload.contains('\n'));
            assert_eq!(&payload, payload.trim());
            assert!(!payload.is_empty());
        }
    }
});
