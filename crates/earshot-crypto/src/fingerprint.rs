//! Human-readable key fingerprints for out-of-band verification.
//!
//! Two peers compare fingerprints over a separate channel (reading them
//! aloud, a photo, any side channel) to rule out a man-in-the-middle on the
//! unauthenticated handshake.

use sha2::{Digest, Sha256};

/// Number of hex characters of the digest shown to the user.
pub const FINGERPRINT_HEX_CHARS: usize = 32;

/// Format a public key as a grouped fingerprint string.
///
/// SHA-256 of the key bytes, uppercase hex, truncated to the first
/// [`FINGERPRINT_HEX_CHARS`] characters and grouped four at a time:
/// `"D3F1 88AC 0912 EE41 ..."`. The same key always yields the same string,
/// so both peers can compare displays character for character.
#[must_use]
pub fn fingerprint(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    let hex = hex::encode_upper(digest);

    let mut grouped = String::with_capacity(FINGERPRINT_HEX_CHARS + FINGERPRINT_HEX_CHARS / 4);
    for (i, c) in hex.chars().take(FINGERPRINT_HEX_CHARS).enumerate() {
        if i > 0 && i % 4 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}
