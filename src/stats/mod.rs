//! Session statistics.
//!
//! Counts what happened to the stream so anomalies (overflows, parse
//! failures, refused sends) are visible after a run.

pub mod counters;

// Re-export commonly used types
pub use counters::{
    create_shared_stats, PostureCounts, SessionStats, SharedSessionStats, StatsSnapshot,
};
