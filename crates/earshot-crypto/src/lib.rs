//! # Earshot Crypto
//!
//! Cryptographic primitives for the Earshot protocol.
//!
//! This crate provides:
//! - Ephemeral P-256 key pairs for ECDH key agreement
//! - SHA-256 key derivation from the ECDH shared secret
//! - AES-256-GCM authenticated encryption of chat payloads
//! - Human-verifiable public key fingerprints
//! - Secure random number generation
//!
//! Key pairs are generated fresh per session and never persisted; everything
//! here is owned by exactly one session and dropped on disconnect.
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Notes |
//! |----------|-----------|-------|
//! | Key Exchange | ECDH over NIST P-256 | ephemeral, one pair per session |
//! | KDF | SHA-256 | over the shared-point x-coordinate |
//! | AEAD | AES-256-GCM | 12-byte random IV, 128-bit tag, no AAD |
//! | Fingerprint | SHA-256 | 32 uppercase hex chars in groups of 4 |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod aead;
pub mod ecdh;
pub mod error;
pub mod fingerprint;
pub mod random;

pub use aead::{EncryptedEnvelope, decrypt, encrypt};
pub use ecdh::{KeyPair, SharedKey};
pub use error::CryptoError;
pub use fingerprint::fingerprint;

/// Uncompressed SEC1 public key size (`0x04 || X || Y`)
pub const PUBLIC_KEY_SIZE: usize = 65;

/// Derived symmetric key size
pub const SHARED_KEY_SIZE: usize = 32;

/// AES-GCM IV size
pub const IV_SIZE: usize = 12;

/// AES-GCM authentication tag size
pub const TAG_SIZE: usize = 16;
