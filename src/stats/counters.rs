//! Session counters.
//!
//! Tracks what the pipeline did with the stream: chunks seen, frames
//! assembled or dropped, postures reported, commands sent.

use crate::core::PostureStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for one session.
#[derive(Debug)]
pub struct SessionStats {
    /// Chunks received from the link
    chunks_received: AtomicU64,
    /// Bytes received from the link
    bytes_received: AtomicU64,
    /// Chunks dropped because they were not valid UTF-8
    invalid_chunks: AtomicU64,
    /// Frames the reassembler completed
    frames_completed: AtomicU64,
    /// Buffers discarded for growing past the frame limit
    buffer_overflows: AtomicU64,
    /// Completed frames the parser rejected
    parse_failures: AtomicU64,
    /// Commands handed to the link
    commands_sent: AtomicU64,
    /// Commands the link refused
    send_failures: AtomicU64,
    /// Classification counts, indexed like `PostureStatus::ALL`
    postures: [AtomicU64; 5],
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            chunks_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            invalid_chunks: AtomicU64::new(0),
            frames_completed: AtomicU64::new(0),
            buffer_overflows: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            commands_sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            postures: Default::default(),
            session_start: Utc::now(),
        }
    }

    /// Record a chunk of `len` bytes.
    pub fn record_chunk(&self, len: usize) {
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(len as u64, Ordering::Relaxed);
    }

    pub fn record_invalid_chunk(&self) {
        self.invalid_chunks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self) {
        self.frames_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overflow(&self) {
        self.buffer_overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_parse_failure(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_posture(&self, status: PostureStatus) {
        self.postures[posture_index(status)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_command_sent(&self) {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> StatsSnapshot {
        let posture = |status| self.postures[posture_index(status)].load(Ordering::Relaxed);

        StatsSnapshot {
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            invalid_chunks: self.invalid_chunks.load(Ordering::Relaxed),
            frames_completed: self.frames_completed.load(Ordering::Relaxed),
            buffer_overflows: self.buffer_overflows.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            postures: PostureCounts {
                steady: posture(PostureStatus::Steady),
                left: posture(PostureStatus::LeanLeft),
                right: posture(PostureStatus::LeanRight),
                forward: posture(PostureStatus::LeanForward),
                back: posture(PostureStatus::LeanBack),
            },
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Chunks received: {} ({} bytes, {} not UTF-8)\n\
             - Frames completed: {}\n\
             - Buffer overflows: {}\n\
             - Parse failures: {}\n\
             - Commands sent: {} ({} failed)\n\
             - Session duration: {} seconds\n\
             \n\
             Postures:\n\
             - Steady: {}\n\
             - Left: {}\n\
             - Right: {}\n\
             - Forward: {}\n\
             - Back: {}",
            stats.chunks_received,
            stats.bytes_received,
            stats.invalid_chunks,
            stats.frames_completed,
            stats.buffer_overflows,
            stats.parse_failures,
            stats.commands_sent,
            stats.send_failures,
            stats.session_duration_secs,
            stats.postures.steady,
            stats.postures.left,
            stats.postures.right,
            stats.postures.forward,
            stats.postures.back,
        )
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.chunks_received,
            &self.bytes_received,
            &self.invalid_chunks,
            &self.frames_completed,
            &self.buffer_overflows,
            &self.parse_failures,
            &self.commands_sent,
            &self.send_failures,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        for counter in &self.postures {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

fn posture_index(status: PostureStatus) -> usize {
    match status {
        PostureStatus::Steady => 0,
        PostureStatus::LeanLeft => 1,
        PostureStatus::LeanRight => 2,
        PostureStatus::LeanForward => 3,
        PostureStatus::LeanBack => 4,
    }
}

/// Per-posture classification counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostureCounts {
    pub steady: u64,
    pub left: u64,
    pub right: u64,
    pub forward: u64,
    pub back: u64,
}

impl PostureCounts {
    pub fn total(&self) -> u64 {
        self.steady + self.left + self.right + self.forward + self.back
    }
}

/// Snapshot of session statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub chunks_received: u64,
    pub bytes_received: u64,
    pub invalid_chunks: u64,
    pub frames_completed: u64,
    pub buffer_overflows: u64,
    pub parse_failures: u64,
    pub commands_sent: u64,
    pub send_failures: u64,
    pub postures: PostureCounts,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared session stats.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create a new shared stats handle.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}
