//! Error types for the earshot protocol core.

use thiserror::Error;

/// Core protocol errors
#[derive(Debug, Error)]
pub enum Error {
    /// Packet decoding error
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Session error
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Cryptographic error
    #[error("crypto error: {0}")]
    Crypto(#[from] earshot_crypto::CryptoError),

    /// Link error
    #[error("link error: {0}")]
    Link(#[from] earshot_link::LinkError),
}

/// Packet decoding errors.
///
/// Both variants are dropped silently by the session; a peer speaking a
/// newer or broken dialect never crashes the receiver.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload is not a well-formed packet
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// Unrecognized type discriminator
    #[error("unknown packet type: {0}")]
    UnknownType(String),
}

/// Session-level errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session is already initialized
    #[error("session already active")]
    AlreadyActive,

    /// Session is not initialized for the requested operation
    #[error("session not ready")]
    NotReady,
}
