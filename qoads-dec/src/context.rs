//! Audio context: registered data and data-source construction
//!
//! One context per process, created with [`AudioContext::init`] and passed to
//! whoever opens sounds. Decoders built by the context depend only on their own
//! state and stream; the context holds nothing they reach back into.
//!
//! Registered data is named in-memory audio. Encoded bytes are shared by every
//! source opened from them; decoded PCM is shared the same way.

use crate::audio::{
    open_backend, Backend, DataFormat, DataSource, PcmSource, SampleFormat, StreamAdapter,
};
use crate::config::DecoderSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Frames per read when draining a source to memory
const DRAIN_CHUNK_FRAMES: u64 = 4096;

/// How data is brought into memory when a source is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingMethod {
    /// Decode incrementally from the underlying stream
    #[default]
    Stream,

    /// Load the encoded bytes into memory, decode incrementally
    Preload,

    /// Decode everything up front and serve PCM
    PreloadDecoded,
}

/// Fully decoded audio.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub format: DataFormat,

    /// Interleaved samples, `frames x channels` long
    pub samples: Vec<i16>,
    pub frames: u64,
}

impl DecodedAudio {
    /// Data source serving these samples.
    pub fn into_source(self) -> Result<PcmSource> {
        PcmSource::new(
            self.samples.into(),
            self.format.channels,
            self.format.sample_rate,
        )
    }
}

enum Registered {
    Encoded(Arc<[u8]>),
    Decoded(PcmSource),
}

/// Process-wide audio state.
pub struct AudioContext {
    settings: DecoderSettings,
    registry: HashMap<String, Registered>,
}

impl AudioContext {
    pub fn init(settings: DecoderSettings) -> Result<Self> {
        settings.validate()?;
        info!(
            priority = ?settings.backend_priority,
            loading = ?settings.loading,
            "Audio context initialized"
        );
        Ok(Self {
            settings,
            registry: HashMap::new(),
        })
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    /// Release all registered data.
    pub fn shutdown(self) {
        info!(registered = self.registry.len(), "Audio context shut down");
    }

    /// Register encoded bytes under `name`, replacing any previous entry.
    pub fn register_encoded(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        let name = name.into();
        debug!(%name, "Registered encoded data");
        self.registry.insert(name, Registered::Encoded(bytes.into()));
    }

    /// Register interleaved PCM under `name`, replacing any previous entry.
    pub fn register_decoded(
        &mut self,
        name: impl Into<String>,
        samples: impl Into<Arc<[i16]>>,
        channels: u32,
        sample_rate: u32,
    ) -> Result<()> {
        let source = PcmSource::new(samples.into(), channels, sample_rate)?;
        let name = name.into();
        debug!(%name, frames = source.length(), "Registered decoded data");
        self.registry.insert(name, Registered::Decoded(source));
        Ok(())
    }

    /// Register raw little-endian PCM in any [`SampleFormat`] under `name`.
    ///
    /// The samples are converted to `i16` once, here.
    pub fn register_raw(
        &mut self,
        name: impl Into<String>,
        sample_format: SampleFormat,
        bytes: &[u8],
        channels: u32,
        sample_rate: u32,
    ) -> Result<()> {
        let samples = sample_format.convert_to_i16(bytes)?;
        self.register_decoded(name, samples, channels, sample_rate)
    }

    pub fn unregister(&mut self, name: &str) -> Result<()> {
        self.registry
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("no registered data named '{}'", name)))
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Open a data source over registered data.
    ///
    /// Registered PCM is always served as PCM. Registered encoded data is
    /// already in memory, so `Stream` and `Preload` behave the same.
    pub fn open(&self, name: &str, method: LoadingMethod) -> Result<Backend<'static>> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("no registered data named '{}'", name)))?;

        match entry {
            Registered::Decoded(source) => Ok(Backend::Pcm(source.clone())),
            Registered::Encoded(bytes) => {
                let adapter = StreamAdapter::new(Cursor::new(Arc::clone(bytes)));
                self.open_adapter(adapter, method)
            }
        }
    }

    /// Open a data source over a file.
    pub fn open_file(&self, path: &Path, method: LoadingMethod) -> Result<Backend<'static>> {
        debug!(path = %path.display(), ?method, "Opening file");
        match method {
            LoadingMethod::Stream => {
                let file = File::open(path)?;
                self.open_adapter(StreamAdapter::new(BufReader::new(file)), method)
            }
            LoadingMethod::Preload | LoadingMethod::PreloadDecoded => {
                let bytes: Arc<[u8]> = std::fs::read(path)?.into();
                self.open_adapter(StreamAdapter::new(Cursor::new(bytes)), method)
            }
        }
    }

    /// Decode a complete encoded stream held in memory.
    pub fn decode_memory(&self, bytes: &[u8]) -> Result<DecodedAudio> {
        let mut backend = open_backend(
            StreamAdapter::new(Cursor::new(bytes)),
            &self.settings.backend_priority,
        )?;
        decode_to_end(&mut backend)
    }

    fn open_adapter<'a>(
        &self,
        adapter: StreamAdapter<'a>,
        method: LoadingMethod,
    ) -> Result<Backend<'a>> {
        let mut backend = open_backend(adapter, &self.settings.backend_priority)?;
        if method == LoadingMethod::PreloadDecoded {
            let decoded = decode_to_end(&mut backend)?;
            return Ok(Backend::Pcm(decoded.into_source()?));
        }
        Ok(backend)
    }
}

/// Drain a data source from its current cursor to the end.
pub fn decode_to_end(source: &mut dyn DataSource) -> Result<DecodedAudio> {
    let format = source.data_format();
    let channels = format.channels as usize;
    let expected = source.length().saturating_sub(source.cursor());

    let mut samples = Vec::new();
    let capacity = usize::try_from(expected)
        .ok()
        .and_then(|frames| frames.checked_mul(channels))
        .ok_or_else(|| Error::OutOfMemory(format!("{} frames do not fit in memory", expected)))?;
    samples.try_reserve_exact(capacity).map_err(|e| {
        Error::OutOfMemory(format!("decoded buffer of {} samples: {}", capacity, e))
    })?;

    let mut chunk = vec![0i16; DRAIN_CHUNK_FRAMES as usize * channels];
    let mut frames = 0u64;
    loop {
        let outcome = source.read(&mut chunk, DRAIN_CHUNK_FRAMES)?;
        let len = outcome.frames_read as usize * channels;
        samples.extend_from_slice(&chunk[..len]);
        frames += outcome.frames_read;
        if outcome.at_end || outcome.frames_read == 0 {
            break;
        }
    }

    Ok(DecodedAudio {
        format,
        samples,
        frames,
    })
}
