//! Payload framing over arbitrary chunk boundaries.
//!
//! The link delivers byte chunks of whatever size it pleases; packet
//! payloads are UTF-8 lines terminated by `\n`. [`ChunkFramer`] reassembles
//! inbound chunks into complete payloads and [`split_payload`] cuts an
//! outbound payload into MTU-sized chunks. Neither side interprets payload
//! content; that is the codec's job.

/// Reassembles inbound chunks into newline-delimited payloads.
///
/// Holds partial bytes across calls until a delimiter arrives. Accumulation
/// is unbounded; the link's own MTU and pacing bound it in practice.
#[derive(Debug, Default)]
pub struct ChunkFramer {
    buffer: Vec<u8>,
}

impl ChunkFramer {
    /// Create an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one chunk and return every payload it completed, in order.
    ///
    /// Bytes that are not valid UTF-8 are decoded permissively with the
    /// replacement character rather than failing the stream. A payload that
    /// is empty after trimming is discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]);
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                payloads.push(trimmed.to_string());
            }
        }
        payloads
    }

    /// Bytes held back waiting for a delimiter.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop any partial payload.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Split a payload into link-sized chunks, appending the `\n` terminator.
///
/// The payload must not itself contain a raw newline; the codec's output
/// never does. Callers pace chunk transmission to the link's throughput
/// ceiling; this function only cuts bytes.
#[must_use]
pub fn split_payload(payload: &str, mtu: usize) -> Vec<Vec<u8>> {
    let mut bytes = payload.as_bytes().to_vec();
    bytes.push(b'\n');

    // chunks() panics on a zero size
    bytes.chunks(mtu.max(1)).map(<[u8]>::to_vec).collect()
}
