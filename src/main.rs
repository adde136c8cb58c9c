//! posture-link CLI
//!
//! Replays captured sensor streams through the posture pipeline and exposes
//! the frame parser and command encoder for manual checks.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use posture_link::{
    config::Config,
    core::{encode_raw, parse, PostureStatus},
    link::{CommandSink, LinkError, LinkEvent, ReplayLink},
    session::PostureSession,
    PROTOCOL_DESCRIPTION, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "posture-link")]
#[command(version = VERSION)]
#[command(about = "Posture classification for a BLE motion sensor stream", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured stream through the pipeline
    Replay {
        /// Capture file holding the raw device text
        file: PathBuf,

        /// Bytes per delivered chunk (defaults to the configured value)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Delay between chunks in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Print final statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse a single frame and print the record
    Parse {
        /// Frame text, e.g. !A01.00@2.00@3.00!G04.00@5.00@6.00!M07.00@8.00@9.00
        frame: String,
    },

    /// Encode an actuator code (0-4) as a command string
    Encode {
        #[arg(allow_negative_numbers = true)]
        code: i64,
    },

    /// Show or update configuration
    Config {
        /// Set the gyro moving-average trigger
        #[arg(long)]
        set_trigger: Option<i64>,

        /// Set the number of samples per moving-average window
        #[arg(long)]
        set_window: Option<usize>,

        /// Set the frame buffer limit in characters
        #[arg(long)]
        set_max_frame: Option<usize>,
    },

    /// Display the device wire protocol
    Protocol,
}

fn main() {
    // Initialize logging. Classifications are printed below, so only anomalies by default
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("posture_link=warn")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Replay {
            file,
            chunk_size,
            interval_ms,
            json,
        } => cmd_replay(&file, chunk_size, interval_ms, json),
        Commands::Parse { frame } => cmd_parse(&frame),
        Commands::Encode { code } => cmd_encode(code),
        Commands::Config {
            set_trigger,
            set_window,
            set_max_frame,
        } => cmd_config(set_trigger, set_window, set_max_frame),
        Commands::Protocol => {
            println!("{PROTOCOL_DESCRIPTION}");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Prints outbound commands instead of transmitting them.
struct ConsoleSink;

impl CommandSink for ConsoleSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        println!("    tx {}", String::from_utf8_lossy(bytes));
        Ok(())
    }
}

fn cmd_replay(
    file: &Path,
    chunk_size: Option<usize>,
    interval_ms: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load().unwrap_or_default();
    if let Some(size) = chunk_size {
        config.replay.chunk_size = size;
    }
    if let Some(ms) = interval_ms {
        config.replay.chunk_interval = Duration::from_millis(ms);
    }
    config.validate()?;

    let mut link = ReplayLink::from_file(config.replay.clone(), file)
        .with_context(|| format!("Could not read capture {file:?}"))?;

    println!("posture-link v{VERSION}");
    println!();
    println!("Replaying {file:?}");
    println!("  Chunks: {} x {} bytes", link.chunk_count(), config.replay.chunk_size);
    println!(
        "  Trigger: ±{} over {} samples",
        config.classifier.gyro_trigger, config.classifier.trigger_count
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut session = PostureSession::with_config(&config, ConsoleSink);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    link.start()?;
    let receiver = link.receiver().clone();

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                let finished = matches!(event, LinkEvent::Disconnected(_));
                if let Some(result) = session.handle_event(&event) {
                    println!(
                        "[{}] {:<8} gyro x={:>6} z={:>6}",
                        event.timestamp().format("%H:%M:%S%.3f"),
                        result.status,
                        result.record.gyro.x,
                        result.record.gyro.z
                    );
                }
                if finished {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !link.is_running() && receiver.is_empty() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                eprintln!("Link disconnected unexpectedly");
                break;
            }
        }
    }

    link.stop();

    let stats = session.stats();
    println!();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats.stats())?);
    } else {
        println!("{}", stats.summary());
    }
    Ok(())
}

fn cmd_parse(frame: &str) -> anyhow::Result<()> {
    let record = parse(frame).context("Frame rejected")?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn cmd_encode(code: i64) -> anyhow::Result<()> {
    let command = encode_raw(code);
    if command.is_empty() {
        bail!("code {code} is outside 0-4");
    }
    match PostureStatus::from_command_code(code) {
        Some(status) => println!("{command}  ({status})"),
        None => println!("{command}"),
    }
    Ok(())
}

fn cmd_config(
    set_trigger: Option<i64>,
    set_window: Option<usize>,
    set_max_frame: Option<usize>,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let changed = set_trigger.is_some() || set_window.is_some() || set_max_frame.is_some();

    if let Some(trigger) = set_trigger {
        config.classifier.gyro_trigger = trigger;
    }
    if let Some(window) = set_window {
        config.classifier.trigger_count = window;
    }
    if let Some(max) = set_max_frame {
        config.framing.max_frame_len = max;
    }

    if changed {
        config.validate()?;
        config.save()?;
        println!("Configuration saved.");
        println!();
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
