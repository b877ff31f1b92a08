//! Leftover-bytes buffer between stream reads.
//!
//! A WebSocket message rarely lines up with the caller's read size. The
//! [`FrameBuffer`] keeps the unread tail of the most recent message in a
//! reusable byte region addressed by a read cursor, so consecutive reads
//! drain it without re-slicing or reallocating.

/// Frame delimiter appended to messages that lack one.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Capacity kept across messages. Larger messages grow the region
/// temporarily; it shrinks back once fully drained.
pub const RETAINED_CAPACITY: usize = 64 * 1024;

/// Reusable byte region holding the undelivered remainder of one message.
#[derive(Debug)]
pub struct FrameBuffer {
    region: Vec<u8>,
    cursor: usize,
}

impl FrameBuffer {
    /// Create an empty buffer with the default retained capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            region: Vec::with_capacity(RETAINED_CAPACITY),
            cursor: 0,
        }
    }

    /// Whether every buffered byte has been delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursor >= self.region.len()
    }

    /// Number of bytes still waiting to be delivered.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.region.len().saturating_sub(self.cursor)
    }

    /// Load a freshly received message, replacing any drained content.
    ///
    /// Appends [`FRAME_DELIMITER`] when the message does not already end
    /// with it. Loading while undelivered bytes remain would lose them, so
    /// callers drain first; the stream adapter only loads when empty.
    pub fn load(&mut self, message: &[u8]) {
        debug_assert!(self.is_empty(), "loading over undelivered bytes");
        self.region.clear();
        self.region.extend_from_slice(message);
        if self.region.last() != Some(&FRAME_DELIMITER) {
            self.region.push(FRAME_DELIMITER);
        }
        self.cursor = 0;
    }

    /// Copy as many buffered bytes as fit into `out` and advance the cursor.
    ///
    /// Returns the number of bytes copied.
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let pending = self.region.get(self.cursor..).unwrap_or_default();
        let count = pending.len().min(out.len());
        if let (Some(dst), Some(src)) = (out.get_mut(..count), pending.get(..count)) {
            dst.copy_from_slice(src);
        }
        self.cursor += count;
        if self.is_empty() {
            self.reset();
        }
        count
    }

    fn reset(&mut self) {
        self.region.clear();
        self.cursor = 0;
        if self.region.capacity() > RETAINED_CAPACITY {
            self.region.shrink_to(RETAINED_CAPACITY);
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
