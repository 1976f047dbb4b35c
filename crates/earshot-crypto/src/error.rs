//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD encryption failed
    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD tag verification failed
    #[error("decryption failed: authentication failure")]
    AuthenticationFailed,

    /// Peer public key rejected (not a valid point on the curve)
    #[error("invalid peer public key")]
    InvalidPeerKey,

    /// Ciphertext shorter than the authentication tag
    #[error("ciphertext too short: expected at least {expected} bytes, got {actual}")]
    CiphertextTooShort {
        /// Minimum length (the tag size)
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Random number generation failed
    #[error("random number generation failed")]
    RandomFailed,
}
