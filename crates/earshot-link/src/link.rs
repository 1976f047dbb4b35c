//! Link trait abstraction over chunked byte transports.
//!
//! This module defines the core `Link` trait that abstracts over different
//! short-range transports (GATT notify/write channels, serial lines, an
//! in-memory pair for tests). The session logic works against this trait and
//! never sees the physical medium.

use async_trait::async_trait;
use std::io;

/// Default chunk size, matching the write ceiling of constrained radio links.
pub const DEFAULT_MTU: usize = 20;

/// Link layer errors
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// I/O error from the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Link is closed
    #[error("link is closed")]
    Closed,

    /// Chunk exceeds the link MTU
    #[error("chunk of {len} bytes exceeds link MTU of {mtu}")]
    ChunkTooLarge {
        /// Size of the rejected chunk
        len: usize,
        /// MTU of the link
        mtu: usize,
    },
}

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Inbound notification from a link.
///
/// Delivered through the receiver handed out when the link is created.
/// Chunks arrive in order but at arbitrary sizes up to the MTU; nothing
/// about payload boundaries is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A chunk of bytes arrived from the peer.
    Chunk(Vec<u8>),
    /// Free-form connectivity or role status text.
    Status(String),
    /// The link closed; no further events follow.
    Closed,
}

/// Async trait over a bidirectional chunked byte transport.
///
/// Implementations deliver inbound traffic as [`LinkEvent`]s on a channel
/// and accept outbound chunks through [`Link::send`]. Chunk pacing is the
/// caller's job; the link only enforces its MTU.
#[async_trait]
pub trait Link: Send + Sync {
    /// Send one chunk to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::ChunkTooLarge`] if the chunk exceeds the MTU,
    /// or [`LinkError::Closed`] if the link is no longer usable.
    async fn send(&self, chunk: &[u8]) -> LinkResult<()>;

    /// Largest chunk this link accepts per send.
    fn mtu(&self) -> usize;

    /// Close the link and release resources.
    ///
    /// After this returns, all subsequent sends fail with
    /// [`LinkError::Closed`] and the event receiver observes
    /// [`LinkEvent::Closed`].
    ///
    /// # Errors
    ///
    /// Returns `LinkError` if closing fails.
    async fn close(&self) -> LinkResult<()>;

    /// Check whether the link is closed.
    fn is_closed(&self) -> bool;

    /// Get link statistics (optional).
    fn stats(&self) -> LinkStats {
        LinkStats::default()
    }
}

/// Link statistics
#[derive(Debug, Clone, Default)]
pub struct LinkStats {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Total chunks sent
    pub chunks_sent: u64,
    /// Total chunks received
    pub chunks_received: u64,
    /// Send errors
    pub send_errors: u64,
}

impl LinkStats {
    /// Create new empty statistics
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful send
    pub fn record_send(&mut self, bytes: usize) {
        self.bytes_sent += bytes as u64;
        self.chunks_sent += 1;
    }

    /// Record a successful receive
    pub fn record_receive(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
        self.chunks_received += 1;
    }

    /// Record a send error
    pub fn record_send_error(&mut self) {
        self.send_errors += 1;
    }
}
