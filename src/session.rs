//! Per-connection processing pipeline.
//!
//! A [`PostureSession`] owns the reassembly and classifier state for one
//! device stream and runs every chunk to completion:
//!
//! ```text
//! bytes ──▶ reassemble ──▶ parse ──▶ classify ──▶ encode ──▶ CommandSink
//! ```
//!
//! Sessions share nothing. Run one per device.

use crate::config::Config;
use crate::core::{
    encode, parse, FeedOutcome, FrameReassembler, PostureClassifier, PostureStatus, SensorRecord,
};
use crate::link::{CommandSink, LinkEvent};
use crate::stats::{create_shared_stats, SharedSessionStats};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// What a completed frame turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub record: SensorRecord,
    pub status: PostureStatus,
    /// Command string handed to the sink
    pub command: &'static str,
    /// Whether the sink accepted the command
    pub sent: bool,
}

/// Processing state for one device stream.
pub struct PostureSession<S: CommandSink> {
    id: Uuid,
    reassembler: FrameReassembler,
    classifier: PostureClassifier,
    sink: S,
    stats: SharedSessionStats,
}

impl<S: CommandSink> PostureSession<S> {
    /// Create a session with default thresholds.
    pub fn new(sink: S) -> Self {
        Self::with_config(&Config::default(), sink)
    }

    pub fn with_config(config: &Config, sink: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            reassembler: FrameReassembler::new(config.framing.max_frame_len),
            classifier: PostureClassifier::new(&config.classifier),
            sink,
            stats: create_shared_stats(),
        }
    }

    /// Process one chunk from the link.
    ///
    /// Returns the classification if the chunk completed a frame that parsed.
    pub fn on_chunk(&mut self, bytes: &[u8]) -> Option<Classification> {
        let _span = info_span!("session", id = %self.id).entered();
        self.stats.record_chunk(bytes.len());

        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(len = bytes.len(), error = %e, "dropping chunk that is not UTF-8");
                self.stats.record_invalid_chunk();
                return None;
            }
        };

        match self.reassembler.feed_outcome(text) {
            FeedOutcome::Frame(frame) => {
                self.stats.record_frame();
                self.process_frame(&frame)
            }
            FeedOutcome::Overflow { .. } => {
                self.stats.record_overflow();
                None
            }
            FeedOutcome::Pending => None,
        }
    }

    /// Dispatch a link event.
    ///
    /// A new connection restarts the protocol, so both the reassembly and
    /// classifier state are cleared.
    pub fn handle_event(&mut self, event: &LinkEvent) -> Option<Classification> {
        match event {
            LinkEvent::Connected(at) => {
                info!(session = %self.id, %at, "device connected");
                self.reset();
                None
            }
            LinkEvent::Data(chunk) => self.on_chunk(&chunk.bytes),
            LinkEvent::Disconnected(at) => {
                info!(session = %self.id, %at, "device disconnected");
                None
            }
        }
    }

    fn process_frame(&mut self, frame: &str) -> Option<Classification> {
        let record = match parse(frame) {
            Ok(record) => record,
            Err(e) => {
                warn!(frame, error = %e, "failed parse");
                self.stats.record_parse_failure();
                return None;
            }
        };

        let status = self.classifier.classify(&record);
        self.stats.record_posture(status);
        debug!(gyro_x = record.gyro.x, gyro_z = record.gyro.z, "record parsed");

        let command = encode(status);
        let sent = match self.sink.send(command.as_bytes()) {
            Ok(()) => {
                self.stats.record_command_sent();
                true
            }
            Err(e) => {
                warn!(command, error = %e, "command not sent");
                self.stats.record_send_failure();
                false
            }
        };
        info!(%status, command, "posture");

        Some(Classification {
            record,
            status,
            command,
            sent,
        })
    }

    /// Clear reassembly and classifier state.
    pub fn reset(&mut self) {
        self.reassembler.reset();
        self.classifier.reset();
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stats(&self) -> SharedSessionStats {
        self.stats.clone()
    }

    pub fn reassembler(&self) -> &FrameReassembler {
        &self.reassembler
    }

    pub fn classifier(&self) -> &PostureClassifier {
        &self.classifier
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Vector;
    use crate::link::{LinkError, RecordingSink};

    fn frame(gyro_x: i64, gyro_z: i64) -> String {
        SensorRecord {
            accel: Vector::new(-1037, -14939, 6112),
            gyro: Vector::new(gyro_x, -116, gyro_z),
            mag: Vector::new(870, -3623, -1348),
        }
        .to_frame()
    }

    struct RefusingSink;

    impl CommandSink for RefusingSink {
        fn send(&mut self, _bytes: &[u8]) -> Result<(), LinkError> {
            Err(LinkError::Closed)
        }
    }

    #[test]
    fn test_each_frame_sends_one_command() {
        let mut session = PostureSession::new(RecordingSink::new());
        for _ in 0..3 {
            let text = frame(500, 0);
            let (a, b) = text.split_at(20);
            assert!(session.on_chunk(a.as_bytes()).is_none());
            assert!(session.on_chunk(b.as_bytes()).is_some());
        }
        assert_eq!(session.sink().commands(), ["!B4@", "!B4@", "!B1@"]);

        let stats = session.stats().stats();
        assert_eq!(stats.frames_completed, 3);
        assert_eq!(stats.commands_sent, 3);
        assert_eq!(stats.postures.forward, 1);
    }

    #[test]
    fn test_parse_failure_leaves_classifier_untouched() {
        let mut session = PostureSession::new(RecordingSink::new());
        session.on_chunk(frame(300, 0).as_bytes());
        let before: Vec<i64> = session.classifier().forward_back_window().iter().collect();

        // Passes the framing heuristic but not the parser
        let bad = frame(900, 0).replace("@-116", "@x-116");
        assert!(session.on_chunk(bad.as_bytes()).is_none());

        let after: Vec<i64> = session.classifier().forward_back_window().iter().collect();
        assert_eq!(before, after);
        assert_eq!(session.stats().stats().parse_failures, 1);
        assert_eq!(session.sink().commands().len(), 1);
    }

    #[test]
    fn test_invalid_utf8_dropped() {
        let mut session = PostureSession::new(RecordingSink::new());
        assert!(session.on_chunk(&[0x21, 0xff, 0xfe]).is_none());
        let stats = session.stats().stats();
        assert_eq!(stats.invalid_chunks, 1);
        assert_eq!(stats.chunks_received, 1);
    }

    #[test]
    fn test_overflow_counted_classifier_kept() {
        let mut session = PostureSession::new(RecordingSink::new());
        session.on_chunk(frame(450, 0).as_bytes());
        session.on_chunk(b"!A0");
        session.on_chunk("9".repeat(120).as_bytes());
        assert_eq!(session.stats().stats().buffer_overflows, 1);
        assert_eq!(session.classifier().forward_back_window().sum(), 450);
    }

    #[test]
    fn test_extreme_gyro_reading_is_classified() {
        let mut session = PostureSession::new(RecordingSink::new());
        let chunk = "!A01.00@2.00@3.00!G09223372036854775807.00@0.00@0.00!M01.00@2.00@3.00";
        for _ in 0..3 {
            let result = session.on_chunk(chunk.as_bytes()).unwrap();
            assert_eq!(result.status, PostureStatus::LeanForward);
        }
        assert_eq!(session.sink().commands(), ["!B1@", "!B1@", "!B1@"]);
    }

    #[test]
    fn test_refused_send_is_reported() {
        let mut session = PostureSession::new(RefusingSink);
        let result = session.on_chunk(frame(0, 0).as_bytes()).unwrap();
        assert_eq!(result.status, PostureStatus::Steady);
        assert!(!result.sent);
        assert_eq!(session.stats().stats().send_failures, 1);
    }

    #[test]
    fn test_connect_resets_state() {
        let mut session = PostureSession::new(RecordingSink::new());
        session.on_chunk(frame(450, 0).as_bytes());
        session.on_chunk(&frame(450, 0).as_bytes()[..10]);
        assert!(!session.reassembler().buffered().is_empty());

        session.handle_event(&LinkEvent::connected());
        assert!(session.reassembler().buffered().is_empty());
        assert_eq!(session.classifier().forward_back_window().sum(), 0);
    }

    #[test]
    fn test_handle_data_event() {
        let mut session = PostureSession::new(RecordingSink::new());
        let result = session.handle_event(&LinkEvent::data(frame(0, -1000)));
        assert_eq!(result.map(|c| c.status), Some(PostureStatus::Steady));
        let result = session.handle_event(&LinkEvent::data(frame(0, -1000)));
        assert_eq!(result.map(|c| c.command), Some("!B2@"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let mut a = PostureSession::new(RecordingSink::new());
        let mut b = PostureSession::new(RecordingSink::new());
        assert_ne!(a.id(), b.id());

        for _ in 0..3 {
            a.on_chunk(frame(800, 0).as_bytes());
        }
        let result = b.on_chunk(frame(800, 0).as_bytes()).unwrap();
        assert_eq!(result.status, PostureStatus::Steady);
        assert_eq!(a.into_sink().commands().last().map(String::as_str), Some("!B1@"));
    }
}
