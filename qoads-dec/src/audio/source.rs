//! Data-source contract and backend registry
//!
//! Every backend exposes the same pull interface ([`DataSource`]); the host
//! holds a [`Backend`] (or a boxed trait object) and never needs to know which
//! container it is draining.

use super::adapter::StreamAdapter;
use super::codec::{FrameCodec, QOA_MAGIC};
use super::frame_decoder::FrameDecoder;
use super::pcm::PcmSource;
use super::types::{DataFormat, ReadOutcome};
use super::wav::WavSource;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Pull-based audio data source.
pub trait DataSource: Send {
    /// Read up to `frame_count` interleaved sample-frames into `out`.
    fn read(&mut self, out: &mut [i16], frame_count: u64) -> Result<ReadOutcome>;

    /// Move the cursor to `target` sample-frames from the start.
    fn seek(&mut self, target: u64) -> Result<()>;

    fn data_format(&self) -> DataFormat;

    /// Current position in sample-frames.
    fn cursor(&self) -> u64;

    /// Total length in sample-frames.
    fn length(&self) -> u64;
}

impl<C: FrameCodec> DataSource for FrameDecoder<'_, C> {
    fn read(&mut self, out: &mut [i16], frame_count: u64) -> Result<ReadOutcome> {
        FrameDecoder::read(self, out, frame_count)
    }

    fn seek(&mut self, target: u64) -> Result<()> {
        FrameDecoder::seek(self, target)
    }

    fn data_format(&self) -> DataFormat {
        FrameDecoder::data_format(self)
    }

    fn cursor(&self) -> u64 {
        FrameDecoder::cursor(self)
    }

    fn length(&self) -> u64 {
        FrameDecoder::length(self)
    }
}

/// Closed set of data-source backends.
pub enum Backend<'a> {
    Qoa(FrameDecoder<'a>),
    Wav(WavSource<'a>),
    Pcm(PcmSource),
}

impl Backend<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Qoa(_) => "qoa",
            Backend::Wav(_) => "wav",
            Backend::Pcm(_) => "pcm",
        }
    }

    fn source(&self) -> &dyn DataSource {
        match self {
            Backend::Qoa(s) => s,
            Backend::Wav(s) => s,
            Backend::Pcm(s) => s,
        }
    }

    fn source_mut(&mut self) -> &mut dyn DataSource {
        match self {
            Backend::Qoa(s) => s,
            Backend::Wav(s) => s,
            Backend::Pcm(s) => s,
        }
    }
}

impl DataSource for Backend<'_> {
    fn read(&mut self, out: &mut [i16], frame_count: u64) -> Result<ReadOutcome> {
        self.source_mut().read(out, frame_count)
    }

    fn seek(&mut self, target: u64) -> Result<()> {
        self.source_mut().seek(target)
    }

    fn data_format(&self) -> DataFormat {
        self.source().data_format()
    }

    fn cursor(&self) -> u64 {
        self.source().cursor()
    }

    fn length(&self) -> u64 {
        self.source().length()
    }
}

/// Encoded container formats that can be probed and opened from a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Qoa,
    Wav,
}

impl BackendKind {
    /// Default probe order.
    pub const DEFAULT_PRIORITY: [BackendKind; 2] = [BackendKind::Qoa, BackendKind::Wav];

    /// Whether `signature` (the first bytes of a stream) looks like this container.
    pub fn matches(self, signature: &[u8]) -> bool {
        match self {
            BackendKind::Qoa => {
                signature.len() >= 4 && signature[..4] == QOA_MAGIC.to_be_bytes()
            }
            BackendKind::Wav => {
                signature.len() >= 12 && &signature[..4] == b"RIFF" && &signature[8..12] == b"WAVE"
            }
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Qoa => write!(f, "qoa"),
            BackendKind::Wav => write!(f, "wav"),
        }
    }
}

const SIGNATURE_LEN: usize = 12;

/// Identify the container by its signature, then rewind the stream to byte 0.
///
/// Returns the first kind in `priority` that recognises the stream.
pub fn probe(adapter: &mut StreamAdapter<'_>, priority: &[BackendKind]) -> Result<BackendKind> {
    let mut signature = [0u8; SIGNATURE_LEN];
    let n = adapter.read_full(&mut signature)?;
    adapter.seek_to(0)?;

    priority
        .iter()
        .copied()
        .find(|kind| kind.matches(&signature[..n]))
        .ok_or_else(|| {
            Error::UnsupportedFormat(format!(
                "no backend among [{}] recognises the stream",
                priority
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// Probe the stream and open the matching backend.
pub fn open_backend<'a>(
    mut adapter: StreamAdapter<'a>,
    priority: &[BackendKind],
) -> Result<Backend<'a>> {
    let kind = probe(&mut adapter, priority)?;
    debug!(backend = %kind, "Probed stream");

    match kind {
        BackendKind::Qoa => Ok(Backend::Qoa(FrameDecoder::new(adapter)?)),
        BackendKind::Wav => Ok(Backend::Wav(WavSource::new(adapter)?)),
    }
}
