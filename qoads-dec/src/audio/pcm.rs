//! In-memory PCM backend for audio that is already decoded.

use super::source::DataSource;
use super::types::{check_read_request, DataFormat, ReadOutcome};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Data source over shared interleaved `i16` samples.
///
/// Clones of the same `Arc` can back any number of sources; each keeps its own cursor.
#[derive(Debug, Clone)]
pub struct PcmSource {
    samples: Arc<[i16]>,
    format: DataFormat,
    length: u64,
    cursor: u64,
}

impl PcmSource {
    pub fn new(samples: Arc<[i16]>, channels: u32, sample_rate: u32) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(Error::InvalidArgs(format!(
                "PCM needs channels and sample rate, got {} / {}",
                channels, sample_rate
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(Error::InvalidArgs(format!(
                "{} samples is not a whole number of {}-channel frames",
                samples.len(),
                channels
            )));
        }

        let length = (samples.len() / channels as usize) as u64;
        Ok(Self {
            samples,
            format: DataFormat::s16(channels, sample_rate),
            length,
            cursor: 0,
        })
    }
}

impl DataSource for PcmSource {
    fn read(&mut self, out: &mut [i16], frame_count: u64) -> Result<ReadOutcome> {
        check_read_request(out, frame_count, self.format.channels)?;

        let frames = frame_count.min(self.length - self.cursor);
        let channels = self.format.channels as usize;
        let start = self.cursor as usize * channels;
        let len = frames as usize * channels;
        out[..len].copy_from_slice(&self.samples[start..start + len]);

        self.cursor += frames;
        Ok(ReadOutcome {
            frames_read: frames,
            at_end: frames < frame_count,
        })
    }

    fn seek(&mut self, target: u64) -> Result<()> {
        if target > self.length {
            return Err(Error::InvalidArgs(format!(
                "seek target {} is past the end ({} frames)",
                target, self.length
            )));
        }
        self.cursor = target;
        Ok(())
    }

    fn data_format(&self) -> DataFormat {
        self.format
    }

    fn cursor(&self) -> u64 {
        self.cursor
    }

    fn length(&self) -> u64 {
        self.length
    }
}
