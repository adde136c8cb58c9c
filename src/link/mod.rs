//! Device link abstraction.
//!
//! This module defines what the core sees of the transport: inbound
//! [`LinkEvent`]s and an outbound [`CommandSink`]. The physical BLE stack is
//! not part of this crate; a [`ReplayLink`] stands in for it by replaying a
//! captured stream.

pub mod replay;
pub mod types;

// Re-export commonly used types
pub use replay::{load_capture, split_chunks, ReplayConfig, ReplayLink};
pub use types::{CommandSink, DataChunk, LinkError, LinkEvent, RecordingSink};
