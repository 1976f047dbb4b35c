//! AES-256-GCM authenticated encryption for chat message bodies.
//!
//! Every call to [`encrypt`] draws a fresh random 96-bit IV; the 128-bit
//! authentication tag is appended to the ciphertext. No associated data is
//! authenticated beyond the message body itself.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};

use crate::ecdh::SharedKey;
use crate::error::CryptoError;
use crate::random::random_12;
use crate::{IV_SIZE, TAG_SIZE};

/// Output of one [`encrypt`] call: the IV used and the tagged ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// Random 96-bit IV, unique per message.
    pub iv: [u8; IV_SIZE],
    /// Ciphertext with the 16-byte authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// Encrypt a message body under the session key.
///
/// # Errors
///
/// Returns [`CryptoError::RandomFailed`] if the system RNG fails, or
/// [`CryptoError::EncryptionFailed`] if the cipher rejects the input.
pub fn encrypt(key: &SharedKey, plaintext: &[u8]) -> Result<EncryptedEnvelope, CryptoError> {
    let iv = random_12()?;

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(EncryptedEnvelope { iv, ciphertext })
}

/// Decrypt and authenticate an envelope under the session key.
///
/// The tag is verified before any plaintext is released; a tampered
/// ciphertext, wrong key, or wrong IV all fail identically.
///
/// # Errors
///
/// Returns [`CryptoError::AuthenticationFailed`] if tag verification fails,
/// or [`CryptoError::CiphertextTooShort`] if the ciphertext cannot even
/// contain the tag.
pub fn decrypt(key: &SharedKey, envelope: &EncryptedEnvelope) -> Result<Vec<u8>, CryptoError> {
    if envelope.ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::CiphertextTooShort {
            expected: TAG_SIZE,
            actual: envelope.ciphertext.len(),
        });
    }

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    cipher
        .decrypt(Nonce::from_slice(&envelope.iv), envelope.ciphertext.as_slice())
        .map_err(|_| CryptoError::AuthenticationFailed)
}
