//! Sensor record types and the text record parser.
//!
//! A frame on the wire looks like:
//!
//! ```text
//! !A0-1037.00@-14939.00@6112.00!G0194.00@-116.00@-266.00!M0870.00@-3623.00@-1348.00
//! ```
//!
//! Three sub-records (acceleration, gyroscope, magnetic), each holding three
//! integer components with a literal `.00` suffix. Parsing is all-or-nothing:
//! either every component is read or no record is produced.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Separator between sub-records.
pub const SEGMENT_SEPARATOR: char = '!';

/// Separator between the components of a sub-record.
pub const FIELD_SEPARATOR: char = '@';

/// Decimal suffix the device appends to every component.
pub const VALUE_SUFFIX: &str = ".00";

/// Sub-record prefixes, in wire order.
const SEGMENT_PREFIXES: [&str; 3] = ["A0", "G0", "M0"];

/// A three-axis integer reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Vector {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

/// One complete reading from the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Accelerometer reading (`!A0` sub-record)
    pub accel: Vector,
    /// Magnetometer reading (`!M0` sub-record)
    pub mag: Vector,
    /// Gyroscope reading (`!G0` sub-record)
    pub gyro: Vector,
}

impl SensorRecord {
    /// Render the record in the device's wire format.
    pub fn to_frame(&self) -> String {
        fn segment(prefix: &str, v: &Vector) -> String {
            format!(
                "{SEGMENT_SEPARATOR}{prefix}{x}{VALUE_SUFFIX}{FIELD_SEPARATOR}{y}{VALUE_SUFFIX}{FIELD_SEPARATOR}{z}{VALUE_SUFFIX}",
                x = v.x,
                y = v.y,
                z = v.z
            )
        }

        let mut frame = segment(SEGMENT_PREFIXES[0], &self.accel);
        frame.push_str(&segment(SEGMENT_PREFIXES[1], &self.gyro));
        frame.push_str(&segment(SEGMENT_PREFIXES[2], &self.mag));
        frame
    }
}

impl FromStr for SensorRecord {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Reasons a frame can fail to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The frame did not split into exactly four `!`-separated segments.
    SegmentCount(usize),
    /// The frame did not start with `!`.
    MissingLeadingMarker,
    /// A sub-record did not carry the prefix expected at its position.
    WrongPrefix {
        expected: &'static str,
        found: String,
    },
    /// A sub-record did not split into exactly three components.
    FieldCount { prefix: &'static str, count: usize },
    /// A component was not a signed integer after stripping `.00`.
    InvalidNumber { prefix: &'static str, field: String },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::SegmentCount(n) => write!(f, "expected 4 segments, found {n}"),
            ParseError::MissingLeadingMarker => write!(f, "frame does not start with '!'"),
            ParseError::WrongPrefix { expected, found } => {
                write!(f, "expected prefix {expected}, found segment {found:?}")
            }
            ParseError::FieldCount { prefix, count } => {
                write!(f, "{prefix}: expected 3 fields, found {count}")
            }
            ParseError::InvalidNumber { prefix, field } => {
                write!(f, "{prefix}: invalid number {field:?}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a complete frame into a [`SensorRecord`].
pub fn parse(frame: &str) -> Result<SensorRecord, ParseError> {
    let segments: Vec<&str> = frame.split(SEGMENT_SEPARATOR).collect();
    if segments.len() != 4 {
        return Err(ParseError::SegmentCount(segments.len()));
    }
    if !segments[0].is_empty() {
        return Err(ParseError::MissingLeadingMarker);
    }

    let accel = parse_segment(segments[1], SEGMENT_PREFIXES[0])?;
    let gyro = parse_segment(segments[2], SEGMENT_PREFIXES[1])?;
    let mag = parse_segment(segments[3], SEGMENT_PREFIXES[2])?;

    Ok(SensorRecord { accel, mag, gyro })
}

/// Parse one `<prefix>x@y@z` sub-record.
fn parse_segment(segment: &str, prefix: &'static str) -> Result<Vector, ParseError> {
    let body = segment
        .strip_prefix(prefix)
        .ok_or_else(|| ParseError::WrongPrefix {
            expected: prefix,
            found: segment.to_string(),
        })?;

    let fields: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
    if fields.len() != 3 {
        return Err(ParseError::FieldCount {
            prefix,
            count: fields.len(),
        });
    }

    let x = parse_component(fields[0], prefix)?;
    let y = parse_component(fields[1], prefix)?;
    let z = parse_component(fields[2], prefix)?;
    Ok(Vector { x, y, z })
}

/// Drop the first `.00` found in the field, wherever it sits, then read an integer.
fn parse_component(field: &str, prefix: &'static str) -> Result<i64, ParseError> {
    let digits = field.replacen(VALUE_SUFFIX, "", 1);
    digits
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidNumber {
            prefix,
            field: field.to_string(),
        })
}
