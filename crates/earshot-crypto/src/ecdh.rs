//! Ephemeral ECDH key agreement on NIST P-256.
//!
//! One key pair is generated per session and discarded on disconnect. The
//! shared symmetric key is the SHA-256 digest of the ECDH shared point's
//! x-coordinate; the raw coordinate is never used as a key directly.

use p256::PublicKey;
use p256::ecdh::EphemeralSecret;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, PUBLIC_KEY_SIZE, SHARED_KEY_SIZE};

/// Ephemeral P-256 key pair.
///
/// Lives exactly as long as one session; a disconnect drops it and a new
/// session generates a fresh pair.
pub struct KeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new ephemeral key pair.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let secret = EphemeralSecret::random(rng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Export the public key as uncompressed SEC1 bytes (`0x04 || X || Y`).
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.public.to_encoded_point(false);
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        bytes.copy_from_slice(point.as_bytes());
        bytes
    }

    /// Derive the session key from the peer's public key bytes.
    ///
    /// Validates that the peer bytes encode a point on the curve, performs
    /// the ECDH exchange, and hashes the shared x-coordinate with SHA-256.
    /// The hash step is a KDF hardening measure and is never skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPeerKey`] if the bytes do not encode a
    /// valid curve point.
    pub fn derive_shared_key(&self, peer_public: &[u8]) -> Result<SharedKey, CryptoError> {
        let peer =
            PublicKey::from_sec1_bytes(peer_public).map_err(|_| CryptoError::InvalidPeerKey)?;

        let shared = self.secret.diffie_hellman(&peer);
        let digest = Sha256::digest(shared.raw_secret_bytes().as_slice());

        let mut key = [0u8; SHARED_KEY_SIZE];
        key.copy_from_slice(&digest);
        Ok(SharedKey(key))
    }

    /// Fingerprint of the local public key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        crate::fingerprint::fingerprint(&self.public_key_bytes())
    }
}

/// Derived 32-byte symmetric session key.
///
/// Present only after a successful handshake; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; SHARED_KEY_SIZE]);

impl SharedKey {
    /// Create a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; SHARED_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SHARED_KEY_SIZE] {
        &self.0
    }
}
