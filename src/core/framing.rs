//! Frame reassembly over an arbitrarily chunked text stream.
//!
//! The device protocol has no length prefix and no terminator byte. A frame
//! is recognised heuristically: it must contain all three sub-record markers,
//! split into at least 7 fields on `@`, and end with `.00`. Accumulation only
//! ever starts at a `!A0` marker; anything before the first marker is noise.
//!
//! Chunk boundaries are assumed not to bisect the `!A0` marker itself. A
//! frame whose marker is split across two chunks is lost.

use tracing::{debug, warn};

/// Marker that opens every frame (acceleration sub-record).
pub const FRAME_START: &str = "!A0";

/// Marker for the gyroscope sub-record.
pub const GYRO_MARKER: &str = "!G0";

/// Marker for the magnetic sub-record.
pub const MAG_MARKER: &str = "!M0";

/// Minimum number of `@`-separated fields in a complete frame.
pub const MIN_FIELDS: usize = 7;

/// Longest buffer (in characters) tolerated before the frame is abandoned.
pub const DEFAULT_MAX_FRAME_LEN: usize = 100;

/// Result of feeding one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// A complete frame was assembled.
    Frame(String),
    /// Still waiting for more input.
    Pending,
    /// The buffer grew past the limit without completing and was discarded.
    Overflow { length: usize },
}

/// Rolling reassembly state for one stream.
#[derive(Debug, Clone)]
pub struct FrameReassembler {
    /// Candidate frame being accumulated
    buffer: String,
    /// Start of the next frame, found mid-chunk
    held_over: String,
    max_frame_len: usize,
}

impl FrameReassembler {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buffer: String::with_capacity(max_frame_len),
            held_over: String::new(),
            max_frame_len,
        }
    }

    /// Feed a chunk and return a frame if one completed.
    pub fn feed(&mut self, chunk: &str) -> Option<String> {
        match self.feed_outcome(chunk) {
            FeedOutcome::Frame(frame) => Some(frame),
            FeedOutcome::Pending | FeedOutcome::Overflow { .. } => None,
        }
    }

    /// Feed a chunk and report exactly what happened.
    pub fn feed_outcome(&mut self, chunk: &str) -> FeedOutcome {
        if !self.held_over.is_empty() {
            self.buffer = std::mem::take(&mut self.held_over);
        }

        if chunk.starts_with(FRAME_START) {
            // Resync: a chunk opening with the marker always starts a new frame
            self.buffer.clear();
            self.buffer.push_str(chunk);
        } else if let Some(pos) = chunk.find(FRAME_START) {
            if self.buffer.is_empty() {
                self.buffer.push_str(&chunk[pos..]);
            } else {
                self.buffer.push_str(&chunk[..pos]);
                self.held_over.push_str(&chunk[pos..]);
            }
        } else if !self.buffer.is_empty() {
            self.buffer.push_str(chunk);
        }

        if !is_complete(&self.buffer) {
            let length = self.buffer.chars().count();
            if length > self.max_frame_len {
                warn!(length, "frame buffer overflow, discarding");
                self.buffer.clear();
                return FeedOutcome::Overflow { length };
            }
            debug!(buffered = length, "waiting for more input");
            return FeedOutcome::Pending;
        }

        FeedOutcome::Frame(std::mem::take(&mut self.buffer))
    }

    /// Text accumulated toward the current frame.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Text carried over to seed the next frame.
    pub fn held_over(&self) -> &str {
        &self.held_over
    }

    /// Drop all buffered text.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.held_over.clear();
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

/// Completeness heuristic for an accumulated buffer.
pub fn is_complete(buffer: &str) -> bool {
    buffer.contains(FRAME_START)
        && buffer.contains(GYRO_MARKER)
        && buffer.contains(MAG_MARKER)
        && buffer.split('@').count() >= MIN_FIELDS
        && buffer.ends_with(".00")
}
