//! qoads-dec - QOA / WAV inspection and decoding tool
//!
//! `info` reports a stream's format and length; `decode` drains it through the
//! decode worker into a 16-bit WAV file.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use qoads_common::time::{format_frames, millis_to_frames};
use qoads_dec::audio::{Channel, DataFormat};
use qoads_dec::config::TomlConfig;
use qoads_dec::{AudioContext, DataSource, DecodeWorker};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for qoads-dec
#[derive(Parser, Debug)]
#[command(name = "qoads-dec")]
#[command(about = "Streaming QOA decoder")]
#[command(version)]
struct Args {
    /// Configuration file (overrides QOADS_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print format and length of an audio file
    Info {
        file: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Decode an audio file to 16-bit WAV
    Decode {
        file: PathBuf,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// First sample-frame to decode
        #[arg(long, conflicts_with = "start_ms")]
        start: Option<u64>,

        /// Start position in milliseconds
        #[arg(long)]
        start_ms: Option<u64>,

        /// Maximum number of sample-frames to decode
        #[arg(long)]
        frames: Option<u64>,
    },
}

#[derive(Serialize)]
struct InfoReport {
    file: PathBuf,
    backend: &'static str,
    format: DataFormat,
    channel_map: Vec<Channel>,
    length_frames: u64,
    duration: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config)?;
    debug!(?config, "Configuration loaded");

    let context = AudioContext::init(config.decoder.clone())
        .context("Failed to initialize audio context")?;

    let result = match args.command {
        Command::Info { file, json } => run_info(&context, &file, json),
        Command::Decode {
            file,
            output,
            start,
            start_ms,
            frames,
        } => run_decode(&context, &file, &output, start, start_ms, frames).await,
    };

    context.shutdown();
    result
}

fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("qoads_dec={}", config.logging.level.to_ascii_lowercase()).into());

    let (stderr_layer, file_layer) = match &config.logging.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            (None, Some(layer))
        }
        None => (
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
            None,
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn run_info(context: &AudioContext, file: &Path, json: bool) -> Result<()> {
    let backend = context
        .open_file(file, context.settings().loading)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let format = backend.data_format();
    let length = backend.length();
    let report = InfoReport {
        file: file.to_path_buf(),
        backend: backend.name(),
        format,
        channel_map: format.channel_map(),
        length_frames: length,
        duration: format_frames(length, format.sample_rate),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("file:        {}", report.file.display());
        println!("backend:     {}", report.backend);
        println!("channels:    {} {:?}", format.channels, report.channel_map);
        println!("sample rate: {} Hz", format.sample_rate);
        println!("length:      {} frames ({})", length, report.duration);
    }
    Ok(())
}

async fn run_decode(
    context: &AudioContext,
    file: &Path,
    output: &Path,
    start: Option<u64>,
    start_ms: Option<u64>,
    max_frames: Option<u64>,
) -> Result<()> {
    let mut backend = context
        .open_file(file, context.settings().loading)
        .with_context(|| format!("Failed to open {}", file.display()))?;
    let format = backend.data_format();

    let start = match (start, start_ms) {
        (Some(frame), _) => frame,
        (None, Some(ms)) => millis_to_frames(ms, format.sample_rate),
        (None, None) => 0,
    };
    if start > backend.length() {
        bail!(
            "Start frame {} is past the end of {} ({} frames)",
            start,
            file.display(),
            backend.length()
        );
    }
    backend.seek(start).context("Seek failed")?;

    let channels = u16::try_from(format.channels).context("Too many channels for WAV")?;
    let spec = hound::WavSpec {
        channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output, spec)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let settings = context.settings();
    let mut worker = DecodeWorker::spawn(
        backend,
        settings.worker_chunk_frames,
        settings.worker_queue_depth,
    )?;

    let limit = max_frames.unwrap_or(u64::MAX);
    let mut written = 0u64;
    while written < limit {
        let Some(chunk) = worker.recv().await else {
            break;
        };
        let take = chunk.frames.min(limit - written);
        for &sample in &chunk.samples[..take as usize * format.channels as usize] {
            writer.write_sample(sample)?;
        }
        written += take;
    }

    worker.stop();
    worker.join().await.context("Decode failed")?;
    writer.finalize().context("Failed to finalize WAV")?;

    info!(
        "Decoded {} frames ({}) to {}",
        written,
        format_frames(written, format.sample_rate),
        output.display()
    );
    Ok(())
}
