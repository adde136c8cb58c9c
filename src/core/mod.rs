//! Core protocol and classification logic.
//!
//! This module contains:
//! - Frame reassembly over a fragmented text stream
//! - Parsing of frames into sensor records
//! - Moving-average posture classification
//! - Encoding of outbound actuator commands

pub mod command;
pub mod framing;
pub mod posture;
pub mod record;
pub mod window;

// Re-export commonly used types
pub use command::{encode, encode_raw};
pub use framing::{FeedOutcome, FrameReassembler, DEFAULT_MAX_FRAME_LEN};
pub use posture::{ClassifierConfig, PostureClassifier, PostureStatus};
pub use record::{parse, ParseError, SensorRecord, Vector};
pub use window::TriggerWindow;
