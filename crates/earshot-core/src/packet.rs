//! Typed protocol packets and their wire codec.
//!
//! Every packet travels as one line of compact JSON: a flat map with a `t`
//! type discriminator, a `u` sender name, and type-specific fields. Decoding
//! tolerates unknown fields so an older peer survives a newer dialect;
//! unknown `t` values are reported as [`DecodeError::UnknownType`] and
//! dropped by the session rather than failing it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use earshot_crypto::{EncryptedEnvelope, IV_SIZE};

use crate::error::DecodeError;

/// Wire value of `t` for a handshake initiation.
pub const TYPE_HANDSHAKE: &str = "hs";
/// Wire value of `t` for a handshake acknowledgement.
pub const TYPE_HANDSHAKE_ACK: &str = "hs_ack";
/// Wire value of `t` for a chat message.
pub const TYPE_CHAT: &str = "chat";
/// Wire value of `t` for a liveness ping.
pub const TYPE_PING: &str = "ping";

/// One protocol packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Handshake initiation carrying the sender's public key.
    Handshake {
        /// Sender display name.
        sender: String,
        /// Uncompressed SEC1 public key bytes.
        public_key: Vec<u8>,
    },
    /// Handshake reply carrying the responder's public key.
    HandshakeAck {
        /// Sender display name.
        sender: String,
        /// Uncompressed SEC1 public key bytes.
        public_key: Vec<u8>,
    },
    /// Chat message.
    Chat {
        /// Sender display name.
        sender: String,
        /// Client-supplied message identifier; not checked for uniqueness.
        id: String,
        /// Sealed or plaintext body.
        body: ChatBody,
    },
    /// Liveness probe.
    Ping {
        /// Sender display name.
        sender: String,
    },
}

/// Body of a chat packet: exactly one of sealed or plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatBody {
    /// AEAD-sealed message body.
    Encrypted(EncryptedEnvelope),
    /// Unencrypted message text.
    Plaintext(String),
}

#[derive(Serialize, Deserialize)]
struct WirePacket {
    t: String,
    u: String,
    #[serde(rename = "pub", skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enc: Option<WireEnvelope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    txt: Option<String>,
}

impl WirePacket {
    fn new(t: &str, u: &str) -> Self {
        Self {
            t: t.to_string(),
            u: u.to_string(),
            public_key: None,
            id: None,
            enc: None,
            txt: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    iv: String,
    ct: String,
}

impl Packet {
    /// Serialize to one line of compact JSON, without the `\n` terminator.
    #[must_use]
    pub fn encode(&self) -> String {
        let wire = match self {
            Self::Handshake { sender, public_key } => {
                let mut wire = WirePacket::new(TYPE_HANDSHAKE, sender);
                wire.public_key = Some(BASE64.encode(public_key));
                wire
            }
            Self::HandshakeAck { sender, public_key } => {
                let mut wire = WirePacket::new(TYPE_HANDSHAKE_ACK, sender);
                wire.public_key = Some(BASE64.encode(public_key));
                wire
            }
            Self::Chat { sender, id, body } => {
                let mut wire = WirePacket::new(TYPE_CHAT, sender);
                wire.id = Some(id.clone());
                match body {
                    ChatBody::Encrypted(envelope) => wire.enc = Some(envelope_to_wire(envelope)),
                    ChatBody::Plaintext(text) => wire.txt = Some(text.clone()),
                }
                wire
            }
            Self::Ping { sender } => WirePacket::new(TYPE_PING, sender),
        };

        // serializing a flat string map cannot fail
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Parse one payload line into a packet.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] for anything that is not a
    /// well-formed packet of a known shape, and
    /// [`DecodeError::UnknownType`] for a well-formed map whose `t` is not
    /// recognized.
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| DecodeError::Malformed(e.to_string()))?;

        // Classify before field validation so an unknown type with missing
        // fields still reports UnknownType.
        let t = value
            .get("t")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| DecodeError::Malformed("missing type discriminator".to_string()))?;
        match t {
            TYPE_HANDSHAKE | TYPE_HANDSHAKE_ACK | TYPE_CHAT | TYPE_PING => {}
            other => return Err(DecodeError::UnknownType(other.to_string())),
        }

        let wire: WirePacket =
            serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Self::from_wire(wire)
    }

    fn from_wire(wire: WirePacket) -> Result<Self, DecodeError> {
        match wire.t.as_str() {
            TYPE_HANDSHAKE | TYPE_HANDSHAKE_ACK => {
                let encoded = wire
                    .public_key
                    .ok_or_else(|| DecodeError::Malformed("handshake without pub".to_string()))?;
                let public_key = BASE64
                    .decode(encoded.as_bytes())
                    .map_err(|e| DecodeError::Malformed(format!("bad pub encoding: {e}")))?;

                if wire.t == TYPE_HANDSHAKE {
                    Ok(Self::Handshake { sender: wire.u, public_key })
                } else {
                    Ok(Self::HandshakeAck { sender: wire.u, public_key })
                }
            }
            TYPE_CHAT => {
                let id = wire
                    .id
                    .ok_or_else(|| DecodeError::Malformed("chat without id".to_string()))?;
                let body = match (wire.enc, wire.txt) {
                    (Some(envelope), None) => ChatBody::Encrypted(envelope_from_wire(&envelope)?),
                    (None, Some(text)) => ChatBody::Plaintext(text),
                    (Some(_), Some(_)) => {
                        return Err(DecodeError::Malformed(
                            "chat with both enc and txt".to_string(),
                        ));
                    }
                    (None, None) => {
                        return Err(DecodeError::Malformed(
                            "chat with neither enc nor txt".to_string(),
                        ));
                    }
                };
                Ok(Self::Chat { sender: wire.u, id, body })
            }
            TYPE_PING => Ok(Self::Ping { sender: wire.u }),
            other => Err(DecodeError::UnknownType(other.to_string())),
        }
    }

    /// Sender display name carried by every packet type.
    #[must_use]
    pub fn sender(&self) -> &str {
        match self {
            Self::Handshake { sender, .. }
            | Self::HandshakeAck { sender, .. }
            | Self::Chat { sender, .. }
            | Self::Ping { sender } => sender,
        }
    }

    /// Wire discriminator for this packet.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Handshake { .. } => TYPE_HANDSHAKE,
            Self::HandshakeAck { .. } => TYPE_HANDSHAKE_ACK,
            Self::Chat { .. } => TYPE_CHAT,
            Self::Ping { .. } => TYPE_PING,
        }
    }
}

fn envelope_to_wire(envelope: &EncryptedEnvelope) -> WireEnvelope {
    WireEnvelope {
        iv: BASE64.encode(envelope.iv),
        ct: BASE64.encode(&envelope.ciphertext),
    }
}

fn envelope_from_wire(wire: &WireEnvelope) -> Result<EncryptedEnvelope, DecodeError> {
    let iv_bytes = BASE64
        .decode(wire.iv.as_bytes())
        .map_err(|e| DecodeError::Malformed(format!("bad iv encoding: {e}")))?;
    let iv: [u8; IV_SIZE] = iv_bytes
        .try_into()
        .map_err(|_| DecodeError::Malformed("iv must be 12 bytes".to_string()))?;
    let ciphertext = BASE64
        .decode(wire.ct.as_bytes())
        .map_err(|e| DecodeError::Malformed(format!("bad ct encoding: {e}")))?;

    Ok(EncryptedEnvelope { iv, ciphertext })
}
