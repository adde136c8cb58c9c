//! Demonstration of the posture pipeline on a synthetic stream.
//!
//! This example shows how to:
//! 1. Build frames in the device wire format
//! 2. Replay them through a link in BLE-sized chunks
//! 3. Drive a session from link events
//! 4. Read back the commands and statistics
//!
//! Run with: cargo run --example replay_demo

use std::time::Duration;

use posture_link::{
    link::{RecordingSink, ReplayConfig, ReplayLink},
    LinkEvent, PostureSession, SensorRecord, Vector, PROTOCOL_DESCRIPTION,
};

fn main() {
    println!("posture-link - Replay Demo");
    println!("==========================");
    println!();
    println!("{PROTOCOL_DESCRIPTION}");

    // Gyro x/z pairs: upright, lean forward, upright, lean left
    let script = [
        (15, -8),
        (30, 4),
        (820, 10),
        (790, -3),
        (805, 0),
        (-10, 0),
        (0, 0),
        (5, 0),
        (0, 950),
        (12, 1010),
        (-4, 980),
    ];

    let transmissions: Vec<Vec<u8>> = script
        .iter()
        .map(|&(x, z)| {
            SensorRecord {
                accel: Vector::new(-1814, -5173, 14478),
                gyro: Vector::new(x, 70, z),
                mag: Vector::new(733, 267, -4803),
            }
            .to_frame()
            .into_bytes()
        })
        .collect();

    let config = ReplayConfig {
        chunk_size: 20,
        chunk_interval: Duration::from_millis(5),
    };
    let mut link = ReplayLink::new(config, transmissions);
    let mut session = PostureSession::new(RecordingSink::new());

    println!("Replaying {} chunks...", link.chunk_count());
    println!();

    if let Err(e) = link.start() {
        eprintln!("Error starting link: {e}");
        return;
    }

    while let Ok(event) = link.receiver().recv_timeout(Duration::from_secs(1)) {
        if let Some(result) = session.handle_event(&event) {
            println!(
                "  gyro x={:>5} z={:>5}  ->  {:<8} {}",
                result.record.gyro.x, result.record.gyro.z, result.status, result.command
            );
        }
        if matches!(event, LinkEvent::Disconnected(_)) {
            break;
        }
    }
    link.stop();

    println!();
    println!("Commands sent: {}", session.sink().commands().join(" "));
    println!();
    println!("{}", session.stats().summary());
}
