//! Replay of a captured device stream.
//!
//! A capture holds one device transmission per line. The replay link cuts
//! each transmission into fixed-size chunks and delivers them on a background
//! thread, the way a BLE UART service hands over one notification payload at
//! a time. Chunking restarts at every transmission, so a frame that opens a
//! transmission always opens a chunk.

use crate::link::types::{LinkError, LinkEvent};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Payload size of one BLE UART notification.
pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// How the capture is cut up and paced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Bytes per delivered chunk
    pub chunk_size: usize,
    /// Delay between chunks
    #[serde(with = "crate::config::duration_millis")]
    pub chunk_interval: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_interval: Duration::from_millis(0),
        }
    }
}

/// Read a capture file. Each non-empty line is one device transmission.
pub fn load_capture(path: &Path) -> Result<Vec<Vec<u8>>, LinkError> {
    let raw = std::fs::read(path).map_err(|e| LinkError::IoError(e.to_string()))?;
    Ok(split_lines(&raw))
}

fn split_lines(raw: &[u8]) -> Vec<Vec<u8>> {
    raw.split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(<[u8]>::to_vec)
        .collect()
}

/// Split `data` into chunks of at most `chunk_size` bytes.
pub fn split_chunks(data: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    data.chunks(chunk_size.max(1)).map(<[u8]>::to_vec).collect()
}

/// A link that replays a capture on a background thread.
///
/// Emits `Connected`, then one `Data` event per chunk, then `Disconnected`.
pub struct ReplayLink {
    config: ReplayConfig,
    transmissions: Arc<Vec<Vec<u8>>>,
    sender: Sender<LinkEvent>,
    receiver: Receiver<LinkEvent>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ReplayLink {
    /// Create a replay link over a list of transmissions.
    pub fn new(config: ReplayConfig, transmissions: Vec<Vec<u8>>) -> Self {
        // Bounded so a stalled consumer applies backpressure to the replay
        let (sender, receiver) = bounded(1_024);

        Self {
            config,
            transmissions: Arc::new(transmissions),
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Create a replay link from a capture file.
    pub fn from_file(config: ReplayConfig, path: &Path) -> Result<Self, LinkError> {
        Ok(Self::new(config, load_capture(path)?))
    }

    /// Start delivering chunks.
    pub fn start(&mut self) -> Result<(), LinkError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(LinkError::AlreadyRunning);
        }
        // Reap a previous run that finished on its own
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();
        let transmissions = self.transmissions.clone();

        let handle = thread::spawn(move || {
            run_replay(&sender, &running, &config, &transmissions);
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop delivering chunks.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    /// Check if the replay thread is still delivering.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for link events.
    pub fn receiver(&self) -> &Receiver<LinkEvent> {
        &self.receiver
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<LinkEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of chunks a full replay delivers.
    pub fn chunk_count(&self) -> usize {
        let size = self.config.chunk_size.max(1);
        self.transmissions
            .iter()
            .map(|t| t.chunks(size).len())
            .sum()
    }
}

impl Drop for ReplayLink {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_replay(
    sender: &Sender<LinkEvent>,
    running: &AtomicBool,
    config: &ReplayConfig,
    transmissions: &[Vec<u8>],
) {
    if !send_while_running(sender, running, LinkEvent::connected()) {
        return;
    }

    for transmission in transmissions {
        for chunk in transmission.chunks(config.chunk_size.max(1)) {
            if !send_while_running(sender, running, LinkEvent::data(chunk)) {
                return;
            }
            if !config.chunk_interval.is_zero() {
                thread::sleep(config.chunk_interval);
            }
        }
    }

    send_while_running(sender, running, LinkEvent::disconnected());
}

/// Block on a full channel, but give up once the link is stopped.
fn send_while_running(sender: &Sender<LinkEvent>, running: &AtomicBool, event: LinkEvent) -> bool {
    let mut event = event;
    while running.load(Ordering::SeqCst) {
        match sender.send_timeout(event, Duration::from_millis(50)) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(e)) => event = e,
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(link: &ReplayLink) -> Vec<LinkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = link.receiver().recv_timeout(Duration::from_secs(2)) {
            let done = matches!(event, LinkEvent::Disconnected(_));
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[test]
    fn test_split_chunks() {
        let chunks = split_chunks(b"abcdefg", 3);
        assert_eq!(chunks, vec![b"abc".to_vec(), b"def".to_vec(), b"g".to_vec()]);
        assert_eq!(split_chunks(b"ab", 0).len(), 2);
        assert!(split_chunks(b"", 4).is_empty());
    }

    #[test]
    fn test_split_lines() {
        let lines = split_lines(b"!A01.00@2.00\r\n\n@3.00\n");
        assert_eq!(lines, vec![b"!A01.00@2.00".to_vec(), b"@3.00".to_vec()]);
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn test_replay_delivers_all_chunks_in_order() {
        let config = ReplayConfig {
            chunk_size: 4,
            chunk_interval: Duration::from_millis(0),
        };
        let mut link = ReplayLink::new(config, vec![b"012345".to_vec(), b"6789".to_vec()]);
        assert_eq!(link.chunk_count(), 3);
        link.start().unwrap();

        let events = drain(&link);
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], LinkEvent::Connected(_)));
        assert!(matches!(events[4], LinkEvent::Disconnected(_)));

        let payload: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                LinkEvent::Data(chunk) => Some(chunk.bytes.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(payload, b"0123456789".to_vec());
        link.stop();
        assert!(!link.is_running());
    }

    #[test]
    fn test_stop_interrupts_replay() {
        let config = ReplayConfig {
            chunk_size: 1,
            chunk_interval: Duration::from_millis(20),
        };
        let mut link = ReplayLink::new(config, vec![vec![b'x'; 1_000]]);
        link.start().unwrap();
        assert!(matches!(link.start(), Err(LinkError::AlreadyRunning)));
        link.stop();
        assert!(!link.is_running());

        let delivered = std::iter::from_fn(|| link.try_recv()).count();
        assert!(delivered < 1_000);
    }
}
