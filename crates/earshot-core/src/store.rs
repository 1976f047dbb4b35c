//! Message history storage.

use crate::message::Message;

/// Durable store for the session message history.
///
/// The core only appends and reloads; retention policy and actual
/// persistence belong to the implementation. The peer driver calls this
/// from its own task, so implementations need [`Send`] but nothing more.
pub trait MessageStore: Send {
    /// Append one message to the history.
    fn save(&mut self, message: Message);

    /// Load the full history, oldest first.
    fn load_all(&self) -> Vec<Message>;

    /// Drop the full history.
    fn clear(&mut self);
}

/// In-memory store, used when no durable backend is wired in.
#[derive(Debug, Default)]
pub struct MemoryStore {
    messages: Vec<Message>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStore for MemoryStore {
    fn save(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn load_all(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}
