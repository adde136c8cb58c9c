//! Transport-facing types for the device link.
//!
//! The link owns the physical connection. The rest of the crate only sees
//! inbound [`LinkEvent`]s and pushes outbound bytes through a [`CommandSink`].

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// A chunk of bytes as delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataChunk {
    /// When the chunk arrived
    pub timestamp: DateTime<Utc>,
    /// Raw bytes, expected to be UTF-8 text
    pub bytes: Vec<u8>,
}

impl DataChunk {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            timestamp: Utc::now(),
            bytes: bytes.into(),
        }
    }
}

/// Inbound notification from the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LinkEvent {
    /// The device connected; the protocol starts from scratch.
    Connected(DateTime<Utc>),
    /// Bytes arrived.
    Data(DataChunk),
    /// The device went away.
    Disconnected(DateTime<Utc>),
}

impl LinkEvent {
    pub fn connected() -> Self {
        LinkEvent::Connected(Utc::now())
    }

    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        LinkEvent::Data(DataChunk::new(bytes))
    }

    pub fn disconnected() -> Self {
        LinkEvent::Disconnected(Utc::now())
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LinkEvent::Connected(t) | LinkEvent::Disconnected(t) => *t,
            LinkEvent::Data(chunk) => chunk.timestamp,
        }
    }
}

/// Errors raised by link implementations.
#[derive(Debug)]
pub enum LinkError {
    AlreadyRunning,
    Closed,
    IoError(String),
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::AlreadyRunning => write!(f, "Link is already running"),
            LinkError::Closed => write!(f, "Link is closed"),
            LinkError::IoError(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for LinkError {}

/// Outbound half of the link. Sends are fire-and-forget: no acknowledgment.
pub trait CommandSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
}

/// Forward commands to a transport thread.
impl CommandSink for Sender<Vec<u8>> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.try_send(bytes.to_vec()).map_err(|_| LinkError::Closed)
    }
}

/// A sink that keeps every command it is given.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    sent: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands in the order they were sent.
    pub fn commands(&self) -> &[String] {
        &self.sent
    }

    pub fn take_commands(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.sent.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        (**self).send(bytes)
    }
}
