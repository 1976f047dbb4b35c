//! The session's view of chat events.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Where a message originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Sent by this session.
    Local,
    /// Received from the peer.
    Remote,
}

/// What kind of event a message records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Ordinary chat traffic.
    Chat,
    /// Session lifecycle notice.
    System,
    /// Recoverable failure surfaced to the user.
    Error,
}

/// One entry in the message log.
///
/// Created by the session on send (optimistic local echo, no delivery
/// acknowledgement) or on receipt; owned by whoever stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Client-supplied identifier; uniqueness is not enforced.
    pub id: String,
    /// Display name of the sender.
    pub sender: String,
    /// Message text as shown to the user.
    pub text: String,
    /// Milliseconds since the Unix epoch at creation.
    pub timestamp_ms: u64,
    /// Which side produced it.
    pub origin: Origin,
    /// Whether the body crossed the wire sealed.
    pub encrypted: bool,
    /// Chat, system notice, or error.
    pub kind: MessageKind,
}

impl Message {
    /// Build a chat entry.
    #[must_use]
    pub fn chat(
        id: impl Into<String>,
        sender: impl Into<String>,
        text: impl Into<String>,
        origin: Origin,
        encrypted: bool,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            text: text.into(),
            timestamp_ms: now_ms(),
            origin,
            encrypted,
            kind: MessageKind::Chat,
        }
    }

    /// Build a session lifecycle notice.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::notice(text, MessageKind::System)
    }

    /// Build a user-visible error entry.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self::notice(text, MessageKind::Error)
    }

    fn notice(text: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: "system".to_string(),
            text: text.into(),
            timestamp_ms: now_ms(),
            origin: Origin::Local,
            encrypted: false,
            kind,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
