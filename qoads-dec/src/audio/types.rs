//! Core audio data types
//!
//! Stream header, data format and read outcome shared by every data-source backend.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Sample encoding of PCM data.
///
/// Every data source in this crate produces [`SampleFormat::S16`]. Raw PCM in
/// any of the other encodings is converted on registration, see
/// [`SampleFormat::convert_to_i16`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    S16,
    S24,
    S32,
    F32,
}

impl SampleFormat {
    /// Size of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 | SampleFormat::F32 => 4,
        }
    }

    /// Convert little-endian raw samples in this encoding to `i16`.
    ///
    /// `bytes` must hold a whole number of samples.
    pub fn convert_to_i16(self, bytes: &[u8]) -> Result<Vec<i16>> {
        let width = self.bytes_per_sample();
        if bytes.len() % width != 0 {
            return Err(Error::InvalidArgs(format!(
                "{} bytes is not a whole number of {:?} samples",
                bytes.len(),
                self
            )));
        }

        let mut samples = Vec::new();
        samples.try_reserve_exact(bytes.len() / width).map_err(|e| {
            Error::OutOfMemory(format!("{} converted samples: {}", bytes.len() / width, e))
        })?;
        samples.extend(bytes.chunks_exact(width).map(|b| match self {
            SampleFormat::U8 => int_to_i16(b[0] as i32 - 128, 8),
            SampleFormat::S16 => i16::from_le_bytes([b[0], b[1]]),
            // Place the 24 bits at the top of an i32, then shift back to sign-extend
            SampleFormat::S24 => int_to_i16(i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8, 24),
            SampleFormat::S32 => int_to_i16(i32::from_le_bytes([b[0], b[1], b[2], b[3]]), 32),
            SampleFormat::F32 => float_to_i16(f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        }));
        Ok(samples)
    }
}

/// Scale a signed integer sample of `bits` width to 16 bits.
pub(crate) fn int_to_i16(sample: i32, bits: u16) -> i16 {
    match bits {
        8 => (sample << 8) as i16,
        16 => sample as i16,
        24 => (sample >> 8) as i16,
        _ => (sample >> 16) as i16,
    }
}

pub(crate) fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Speaker position of one interleaved channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Mono,
    FrontLeft,
    FrontRight,
    FrontCenter,
    Lfe,
    BackLeft,
    BackRight,
    BackCenter,
    SideLeft,
    SideRight,
    /// Channel with no standard position, numbered from 0
    Aux(u32),
}

/// Standard channel order for `channels` interleaved channels (FLAC/Vorbis ordering).
///
/// Counts above 8 map the extra channels to [`Channel::Aux`].
pub fn standard_channel_map(channels: u32) -> Vec<Channel> {
    use Channel::*;

    match channels {
        0 => Vec::new(),
        1 => vec![Mono],
        2 => vec![FrontLeft, FrontRight],
        3 => vec![FrontLeft, FrontRight, FrontCenter],
        4 => vec![FrontLeft, FrontRight, BackLeft, BackRight],
        5 => vec![FrontLeft, FrontRight, FrontCenter, BackLeft, BackRight],
        6 => vec![FrontLeft, FrontRight, FrontCenter, Lfe, BackLeft, BackRight],
        7 => vec![FrontLeft, FrontRight, FrontCenter, Lfe, BackCenter, SideLeft, SideRight],
        n => {
            let mut map = vec![
                FrontLeft, FrontRight, FrontCenter, Lfe, BackLeft, BackRight, SideLeft, SideRight,
            ];
            map.extend((0..n - 8).map(Aux));
            map
        }
    }
}

/// Format reported by a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataFormat {
    /// Sample encoding of the frames `read` produces
    pub sample_format: SampleFormat,

    /// Number of interleaved channels
    pub channels: u32,

    /// Sample-frames per second
    pub sample_rate: u32,
}

impl DataFormat {
    /// Signed 16-bit format with the given layout
    pub fn s16(channels: u32, sample_rate: u32) -> Self {
        Self {
            sample_format: SampleFormat::S16,
            channels,
            sample_rate,
        }
    }

    /// Speaker layout for this format's channel count
    pub fn channel_map(&self) -> Vec<Channel> {
        standard_channel_map(self.channels)
    }
}

/// Parsed container header. Immutable once the decoder is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub channel_count: u32,
    pub sample_rate: u32,
    pub total_sample_frames: u64,

    /// Byte offset of the first encoded frame from the start of the stream
    pub first_frame_byte_offset: u64,
}

impl StreamHeader {
    pub fn data_format(&self) -> DataFormat {
        DataFormat::s16(self.channel_count, self.sample_rate)
    }
}

/// Result of a successful `read` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Sample-frames written to the output buffer
    pub frames_read: u64,

    /// The stream ran out before the request was satisfied
    pub at_end: bool,
}

impl ReadOutcome {
    pub fn complete(frames_read: u64) -> Self {
        Self {
            frames_read,
            at_end: false,
        }
    }

    pub fn end(frames_read: u64) -> Self {
        Self {
            frames_read,
            at_end: true,
        }
    }

    /// Frames read, or [`Error::AtEnd`] when the stream produced nothing because it is exhausted.
    pub fn into_result(self) -> Result<u64> {
        if self.at_end && self.frames_read == 0 {
            Err(Error::AtEnd)
        } else {
            Ok(self.frames_read)
        }
    }
}

/// Check an output buffer can hold `frame_count` frames of `channels` samples.
pub(crate) fn check_read_request(out: &[i16], frame_count: u64, channels: u32) -> Result<()> {
    if frame_count == 0 {
        return Err(Error::InvalidArgs("frame count must be non-zero".to_string()));
    }
    let needed = frame_count
        .checked_mul(channels as u64)
        .ok_or_else(|| Error::InvalidArgs(format!("frame count {} overflows", frame_count)))?;
    if (out.len() as u64) < needed {
        return Err(Error::InvalidArgs(format!(
            "output holds {} samples, {} frames x {} channels requested",
            out.len(),
            frame_count,
            channels
        )));
    }
    Ok(())
}
