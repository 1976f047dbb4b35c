//! Fuzz target for peer public key handling
//!
//! Tests that shared-key derivation and fingerprinting of attacker-controlled
//! key bytes never panic, only return Ok or Err.

#![no_main]

use std::sync::OnceLock;

use earshot_crypto::{KeyPair, fingerprint};
use libfuzzer_sys::fuzz_target;
use rand_core::OsRng;

fn local_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate(&mut OsRng))
}

fuzz_target!(|data: &[u8]| {
    let _ = local_pair().derive_shared_key(data);
    let _ = fingerprint(data);
});
