//! posture-link - frame reassembly and posture classification for a wearable
//! BLE motion sensor.
//!
//! The sensor streams accelerometer, gyroscope and magnetometer readings as
//! text over a BLE UART link. Deliveries are cut at arbitrary byte
//! boundaries, so records have to be reassembled before they can be parsed.
//! Each parsed record feeds a moving-average classifier, and the resulting
//! posture is sent back to the device as an actuator command.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          posture-link                            │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌────────────┐   │
//! │  │   Link   │──▶│  Framing   │──▶│  Record  │──▶│  Posture   │   │
//! │  │ (chunks) │   │ (reassemble│   │ (parse)  │   │ (classify) │   │
//! │  └──────────┘   └────────────┘   └──────────┘   └────────────┘   │
//! │       ▲                                               │          │
//! │       │              ┌──────────┐                     │          │
//! │       └──────────────│ Command  │◀────────────────────┘          │
//! │                      │ (encode) │                                │
//! │                      └──────────┘                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use posture_link::{link::RecordingSink, PostureSession, PostureStatus};
//!
//! let mut session = PostureSession::new(RecordingSink::new());
//!
//! // A frame split across two deliveries
//! assert!(session.on_chunk(b"!A0-1037.00@-14939.00@6112.00").is_none());
//! let result = session
//!     .on_chunk(b"!G0194.00@-116.00@-266.00!M0870.00@-3623.00@-1348.00")
//!     .unwrap();
//!
//! assert_eq!(result.status, PostureStatus::Steady);
//! assert_eq!(session.sink().commands(), ["!B4@"]);
//! ```

pub mod config;
pub mod core;
pub mod link;
pub mod session;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, FramingConfig};
pub use core::{
    encode, encode_raw, parse, ClassifierConfig, FeedOutcome, FrameReassembler, ParseError,
    PostureClassifier, PostureStatus, SensorRecord, Vector,
};
pub use link::{CommandSink, LinkError, LinkEvent, RecordingSink, ReplayConfig, ReplayLink};
pub use session::{Classification, PostureSession};
pub use stats::{SessionStats, SharedSessionStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wire protocol reference that can be displayed to users.
pub const PROTOCOL_DESCRIPTION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║               POSTURE-LINK - DEVICE WIRE PROTOCOL                ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  DEVICE → HOST (sensor frame, text):                             ║
║    !A0<ax>@<ay>@<az>!G0<gx>@<gy>@<gz>!M0<mx>@<my>@<mz>           ║
║    • A0 accelerometer, G0 gyroscope, M0 magnetometer             ║
║    • every value is a signed integer followed by ".00"           ║
║    • no length prefix, no terminator; chunks split anywhere      ║
║    • a buffer over 100 characters without a frame is dropped     ║
║                                                                  ║
║  HOST → DEVICE (actuator command):                               ║
║    !B<n>@                                                        ║
║    • 0 lean left      • 1 lean forward    • 2 lean right         ║
║    • 3 lean back      • 4 steady                                 ║
║                                                                  ║
║  A lean is reported when the 3-sample moving average of gyro.x   ║
║  (forward/back) or gyro.z (left/right) passes ±400.              ║
║  Forward/back is checked first.                                  ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_description_contents() {
        assert!(PROTOCOL_DESCRIPTION.contains("!A0"));
        assert!(PROTOCOL_DESCRIPTION.contains("!B<n>@"));
        assert!(PROTOCOL_DESCRIPTION.contains("steady"));
    }
}
