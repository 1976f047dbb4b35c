//! In-process link pair.
//!
//! Two [`MemoryLink`] halves joined by channels, behaving like a connected
//! chunk transport: in-order delivery, a shared closed flag, per-side
//! statistics. Used by the integration tests and demos in place of a radio.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::link::{Link, LinkError, LinkEvent, LinkResult, LinkStats};

const CHANNEL_CAPACITY: usize = 64;

/// One half of an in-process link pair.
///
/// Created only through [`MemoryLink::pair`]. Closing either half closes
/// both; each receiver then observes [`LinkEvent::Closed`]. Clones share
/// the underlying channels, closed flag, and statistics.
#[derive(Clone)]
pub struct MemoryLink {
    to_peer: mpsc::Sender<LinkEvent>,
    to_local: mpsc::Sender<LinkEvent>,
    mtu: usize,
    closed: Arc<AtomicBool>,
    stats: Arc<Mutex<LinkStats>>,
    peer_stats: Arc<Mutex<LinkStats>>,
}

impl MemoryLink {
    /// Create a connected pair of links with the given MTU.
    ///
    /// Returns each half together with the receiver on which its inbound
    /// [`LinkEvent`]s arrive.
    #[must_use]
    pub fn pair(mtu: usize) -> ((Self, mpsc::Receiver<LinkEvent>), (Self, mpsc::Receiver<LinkEvent>)) {
        let (a_tx, a_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (b_tx, b_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let closed = Arc::new(AtomicBool::new(false));
        let a_stats = Arc::new(Mutex::new(LinkStats::new()));
        let b_stats = Arc::new(Mutex::new(LinkStats::new()));

        let a = Self {
            to_peer: b_tx.clone(),
            to_local: a_tx.clone(),
            mtu,
            closed: Arc::clone(&closed),
            stats: Arc::clone(&a_stats),
            peer_stats: Arc::clone(&b_stats),
        };
        let b = Self {
            to_peer: a_tx,
            to_local: b_tx,
            mtu,
            closed,
            stats: b_stats,
            peer_stats: a_stats,
        };

        ((a, a_rx), (b, b_rx))
    }

    /// Deliver a status line to this half's own receiver.
    ///
    /// Stands in for the connectivity notifications a real transport stack
    /// raises ("advertising", "subscribed", ...).
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Closed`] if the link is closed.
    pub async fn notify_status(&self, status: &str) -> LinkResult<()> {
        if self.is_closed() {
            return Err(LinkError::Closed);
        }
        self.to_local
            .send(LinkEvent::Status(status.to_string()))
            .await
            .map_err(|_| LinkError::Closed)
    }
}

fn lock_stats(stats: &Mutex<LinkStats>) -> MutexGuard<'_, LinkStats> {
    stats.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Link for MemoryLink {
    async fn send(&self, chunk: &[u8]) -> LinkResult<()> {
        if self.is_closed() {
            lock_stats(&self.stats).record_send_error();
            return Err(LinkError::Closed);
        }
        if chunk.len() > self.mtu {
            lock_stats(&self.stats).record_send_error();
            return Err(LinkError::ChunkTooLarge {
                len: chunk.len(),
                mtu: self.mtu,
            });
        }

        self.to_peer
            .send(LinkEvent::Chunk(chunk.to_vec()))
            .await
            .map_err(|_| {
                lock_stats(&self.stats).record_send_error();
                LinkError::Closed
            })?;

        lock_stats(&self.stats).record_send(chunk.len());
        lock_stats(&self.peer_stats).record_receive(chunk.len());
        Ok(())
    }

    fn mtu(&self) -> usize {
        self.mtu
    }

    async fn close(&self) -> LinkResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!("memory link closed");

        // Receivers may already be gone; closure is best-effort.
        let _ = self.to_local.send(LinkEvent::Closed).await;
        let _ = self.to_peer.send(LinkEvent::Closed).await;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn stats(&self) -> LinkStats {
        lock_stats(&self.stats).clone()
    }
}
