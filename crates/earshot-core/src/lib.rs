//! # Earshot Core
//!
//! Core protocol implementation for earshot: an authenticated,
//! end-to-end-encrypted messaging session between exactly two peers joined
//! by a short-range, low-throughput, chunked byte link.
//!
//! This crate provides:
//! - Payload framing over arbitrary chunk boundaries
//! - The typed packet codec (handshake, chat, ping)
//! - The session state machine and ephemeral-key handshake
//! - Message history storage
//! - An async peer driver tying a session to a link and a store
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Peer                                    │
//! │   (tokio task: link events in, paced chunks and messages out)   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                         Session                                  │
//! │   (state machine, handshake, sealing; no I/O of its own)        │
//! ├────────────────────────────┬────────────────────────────────────┤
//! │        Packet Codec        │          Chunk Framer              │
//! │   (typed packets ↔ JSON)   │   (chunks ↔ delimited payloads)    │
//! └────────────────────────────┴────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod error;
pub mod framer;
pub mod message;
pub mod packet;
pub mod peer;
pub mod session;
pub mod store;

pub use error::{DecodeError, Error, SessionError};
pub use framer::{ChunkFramer, split_payload};
pub use message::{Message, MessageKind, Origin};
pub use packet::{ChatBody, Packet};
pub use peer::{Peer, PeerConfig, PeerEvent, SharedStore};
pub use session::{DECRYPTION_FAILED, Role, Session, SessionOutput, SessionState};
pub use store::{MemoryStore, MessageStore};
