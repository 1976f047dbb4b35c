//! Session state machine.
//!
//! A [`Session`] owns the key material for one two-peer conversation and
//! drives the handshake, classification, and sealing of packets. It performs
//! no I/O: every entry point returns the [`SessionOutput`]s the caller must
//! act on (lines to transmit, messages for the log, status text to display).
//! The peer driver in [`crate::peer`] is one such caller; tests are another.
//!
//! Handshake shape: either side sends `hs` with its public key; the receiver
//! derives the shared key and answers `hs_ack` with its own key, which lets
//! the initiator derive too. One round trip in the happy path, no retries,
//! no timeout. A peer that never completes the handshake leaves the session
//! in [`SessionState::ConnectedUnencrypted`] indefinitely.

use rand_core::OsRng;
use uuid::Uuid;

use earshot_crypto::{KeyPair, SharedKey, decrypt, encrypt};

use crate::error::SessionError;
use crate::framer::ChunkFramer;
use crate::message::{Message, Origin};
use crate::packet::{ChatBody, Packet};

/// Text surfaced in place of a chat body that failed authentication.
///
/// A tampered or undecryptable message is shown, not dropped; the user sees
/// that something arrived and that it could not be trusted.
pub const DECRYPTION_FAILED: &str = "[DECRYPTION FAILED]";

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No role chosen, nothing active.
    Idle,
    /// Role chosen and link active; no peer traffic observed yet.
    LinkReady,
    /// Peer traffic flowing, no shared key.
    ConnectedUnencrypted,
    /// Shared key derived; outbound chat bodies are sealed.
    ConnectedEncrypted,
}

/// Which side of the link this session drives.
///
/// The protocol itself is role-agnostic; the role only selects the link
/// implementation and is kept for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Accepts the incoming link (advertiser side).
    Host,
    /// Initiates the link (scanner side).
    Joiner,
}

/// Effect the caller must apply after a session entry point returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutput {
    /// Encoded packet line to split into chunks and transmit.
    Send(String),
    /// Message to append to the log.
    Message(Message),
    /// Status text to display.
    Status(String),
}

/// State machine for one two-peer messaging session.
///
/// Construct with [`Session::new`], activate with [`Session::init`], tear
/// down with [`Session::disconnect`]. All key material lives here and dies
/// here; nothing survives a disconnect.
pub struct Session {
    state: SessionState,
    role: Option<Role>,
    name: String,
    peer_name: Option<String>,
    keys: Option<KeyPair>,
    shared_key: Option<SharedKey>,
    framer: ChunkFramer,
}

impl Session {
    /// Create an idle session with no role or keys.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            role: None,
            name: String::new(),
            peer_name: None,
            keys: None,
            shared_key: None,
            framer: ChunkFramer::new(),
        }
    }

    /// Activate the session: choose a role, bind the display name, and
    /// generate the ephemeral key pair.
    ///
    /// The key pair is generated exactly once per session; it is discarded
    /// only by [`Session::disconnect`], never regenerated mid-session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyActive`] if the session has a role
    /// already; tear it down first.
    pub fn init(&mut self, name: impl Into<String>, role: Role) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyActive);
        }

        self.name = name.into();
        self.role = Some(role);
        if self.keys.is_none() {
            self.keys = Some(KeyPair::generate(&mut OsRng));
        }
        self.transition(SessionState::LinkReady);
        Ok(())
    }

    /// Compose a chat message.
    ///
    /// Seals the body if a shared key exists, otherwise sends plaintext.
    /// The local echo is emitted immediately, before any delivery; "sent"
    /// and "delivered" are distinct concepts and this core tracks only the
    /// former.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] while idle.
    pub fn send_message(&self, text: &str) -> Result<Vec<SessionOutput>, SessionError> {
        if self.state == SessionState::Idle {
            return Err(SessionError::NotReady);
        }

        let id = Uuid::new_v4().to_string();
        let (body, sealed) = match &self.shared_key {
            Some(key) => match encrypt(key, text.as_bytes()) {
                Ok(envelope) => (ChatBody::Encrypted(envelope), true),
                Err(e) => {
                    // Never fall back to plaintext on a sealing failure.
                    return Ok(vec![SessionOutput::Message(Message::error(format!(
                        "encryption failed: {e}"
                    )))]);
                }
            },
            None => (ChatBody::Plaintext(text.to_string()), false),
        };

        let packet = Packet::Chat {
            sender: self.name.clone(),
            id: id.clone(),
            body,
        };
        Ok(vec![
            SessionOutput::Message(Message::chat(id, self.name.clone(), text, Origin::Local, sealed)),
            SessionOutput::Send(packet.encode()),
        ])
    }

    /// Send the local public key as a handshake (`ack = false`) or as a
    /// handshake acknowledgement (`ack = true`).
    ///
    /// Resending mid-session transmits the same key; the ephemeral pair is
    /// never regenerated while the session lives.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] before [`Session::init`].
    pub fn send_handshake(&self, ack: bool) -> Result<Vec<SessionOutput>, SessionError> {
        let Some(keys) = &self.keys else {
            return Err(SessionError::NotReady);
        };

        let public_key = keys.public_key_bytes().to_vec();
        let packet = if ack {
            Packet::HandshakeAck { sender: self.name.clone(), public_key }
        } else {
            Packet::Handshake { sender: self.name.clone(), public_key }
        };
        Ok(vec![SessionOutput::Send(packet.encode())])
    }

    /// Send a liveness probe.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotReady`] while idle.
    pub fn send_ping(&self) -> Result<Vec<SessionOutput>, SessionError> {
        if self.state == SessionState::Idle {
            return Err(SessionError::NotReady);
        }

        let packet = Packet::Ping { sender: self.name.clone() };
        Ok(vec![SessionOutput::Send(packet.encode())])
    }

    /// Absorb one inbound chunk from the link.
    ///
    /// Runs every payload the chunk completes through the codec and the
    /// dispatcher. Payloads that fail to decode are logged and dropped;
    /// nothing in the inbound path is fatal.
    pub fn on_chunk(&mut self, chunk: &[u8]) -> Vec<SessionOutput> {
        let payloads = self.framer.feed(chunk);

        let mut outputs = Vec::new();
        for payload in payloads {
            match Packet::decode(&payload) {
                Ok(packet) => outputs.extend(self.handle_packet(packet)),
                Err(e) => tracing::debug!(error = %e, "dropping undecodable payload"),
            }
        }
        outputs
    }

    /// Forward link connectivity/role status to the caller.
    pub fn on_link_status(&mut self, status: &str) -> Vec<SessionOutput> {
        vec![SessionOutput::Status(status.to_string())]
    }

    /// React to the link reporting closure. Equivalent to a local
    /// [`Session::disconnect`].
    pub fn on_link_closed(&mut self) -> Vec<SessionOutput> {
        self.disconnect()
    }

    /// Tear the session down unconditionally from any state.
    ///
    /// Drops the key pair and shared key, clears the reassembly buffer and
    /// peer identity, and returns to [`SessionState::Idle`]. The only
    /// cancellation mechanism there is.
    pub fn disconnect(&mut self) -> Vec<SessionOutput> {
        if self.state == SessionState::Idle {
            return Vec::new();
        }

        tracing::info!(peer = self.peer_name.as_deref(), "session reset");
        self.role = None;
        self.peer_name = None;
        self.keys = None;
        self.shared_key = None;
        self.framer.clear();
        self.transition(SessionState::Idle);

        vec![SessionOutput::Message(Message::system("disconnected"))]
    }

    fn handle_packet(&mut self, packet: Packet) -> Vec<SessionOutput> {
        if self.state == SessionState::Idle {
            tracing::debug!(kind = packet.kind(), "dropping packet while idle");
            return Vec::new();
        }

        // First packet of any type establishes the peer.
        self.peer_name = Some(packet.sender().to_string());
        if self.state == SessionState::LinkReady {
            self.transition(SessionState::ConnectedUnencrypted);
        }

        match packet {
            Packet::Handshake { sender, public_key } => {
                self.handle_handshake(&sender, &public_key, true)
            }
            Packet::HandshakeAck { sender, public_key } => {
                self.handle_handshake(&sender, &public_key, false)
            }
            Packet::Chat { sender, id, body } => self.handle_chat(sender, id, body),
            Packet::Ping { sender } => vec![SessionOutput::Status(format!("ping from {sender}"))],
        }
    }

    fn handle_handshake(
        &mut self,
        sender: &str,
        peer_public: &[u8],
        reply: bool,
    ) -> Vec<SessionOutput> {
        // A packet only reaches here after init, which generated the pair.
        let Some(keys) = &self.keys else {
            return Vec::new();
        };
        let derived = keys.derive_shared_key(peer_public);
        let local_public = keys.public_key_bytes();

        match derived {
            Ok(key) => {
                self.shared_key = Some(key);
                self.transition(SessionState::ConnectedEncrypted);

                let mut outputs = vec![SessionOutput::Status(format!(
                    "encryption established with {sender}"
                ))];
                if reply {
                    // Only an initiating handshake gets an ack; acking an
                    // ack would ping-pong forever.
                    let packet = Packet::HandshakeAck {
                        sender: self.name.clone(),
                        public_key: local_public.to_vec(),
                    };
                    outputs.push(SessionOutput::Send(packet.encode()));
                }
                outputs
            }
            Err(e) => {
                tracing::warn!(error = %e, sender, "handshake key rejected");
                vec![SessionOutput::Message(Message::error(format!(
                    "handshake failed: {e}"
                )))]
            }
        }
    }

    fn handle_chat(&mut self, sender: String, id: String, body: ChatBody) -> Vec<SessionOutput> {
        match body {
            ChatBody::Encrypted(envelope) => {
                let opened = self
                    .shared_key
                    .as_ref()
                    .ok_or(earshot_crypto::CryptoError::AuthenticationFailed)
                    .and_then(|key| decrypt(key, &envelope));
                match opened {
                    Ok(plain) => {
                        let text = String::from_utf8_lossy(&plain).into_owned();
                        vec![SessionOutput::Message(Message::chat(
                            id,
                            sender,
                            text,
                            Origin::Remote,
                            true,
                        ))]
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, %sender, "failed to open chat body");
                        vec![SessionOutput::Message(Message::chat(
                            id,
                            sender,
                            DECRYPTION_FAILED,
                            Origin::Remote,
                            false,
                        ))]
                    }
                }
            }
            ChatBody::Plaintext(text) => {
                if self.is_encrypted() {
                    tracing::warn!(%sender, "plaintext chat accepted while session is encrypted");
                }
                vec![SessionOutput::Message(Message::chat(
                    id,
                    sender,
                    text,
                    Origin::Remote,
                    false,
                ))]
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "session state change");
            self.state = next;
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether peer traffic has been observed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(
            self.state,
            SessionState::ConnectedUnencrypted | SessionState::ConnectedEncrypted
        )
    }

    /// Whether a shared key is present. Always equals "state is
    /// [`SessionState::ConnectedEncrypted`]" once traffic flows.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.shared_key.is_some()
    }

    /// Local display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Peer display name, once any packet has arrived.
    #[must_use]
    pub fn peer_name(&self) -> Option<&str> {
        self.peer_name.as_deref()
    }

    /// Chosen role, while active.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Fingerprint of the local public key, for out-of-band verification.
    #[must_use]
    pub fn fingerprint(&self) -> Option<String> {
        self.keys.as_ref().map(KeyPair::fingerprint)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
