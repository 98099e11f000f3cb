//! WAV backend
//!
//! Uncompressed PCM through `hound`, converted to interleaved `i16` so it
//! satisfies the same contract as the QOA decoder.
//!
//! **Stream failures:** hound counts a sample as read even when reading it
//! failed, and a failed read may have consumed part of the sample. After any
//! failure the reader is rebuilt from the start of the stream and positioned
//! on the first frame not handed out, so the next `read` resumes on a frame
//! boundary.

use super::adapter::StreamAdapter;
use super::source::DataSource;
use super::types::{check_read_request, float_to_i16, int_to_i16, DataFormat, ReadOutcome};
use crate::error::{Error, Result};
use hound::{SampleFormat as WavSampleFormat, WavReader};
use std::io;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Int(u16),
    Float,
}

/// Data source over a PCM WAV stream.
pub struct WavSource<'a> {
    /// `None` once a resync after a stream failure has itself failed
    reader: Option<WavReader<StreamAdapter<'a>>>,
    encoding: Encoding,
    format: DataFormat,
    length: u64,
    cursor: u64,
}

impl<'a> WavSource<'a> {
    pub fn new(adapter: StreamAdapter<'a>) -> Result<Self> {
        let reader = WavReader::new(adapter)?;
        let spec = reader.spec();

        if spec.channels == 0 {
            return Err(Error::InvalidFile("WAV: zero channels".to_string()));
        }
        let encoding = match (spec.sample_format, spec.bits_per_sample) {
            (WavSampleFormat::Int, bits @ (8 | 16 | 24 | 32)) => Encoding::Int(bits),
            (WavSampleFormat::Float, 32) => Encoding::Float,
            (format, bits) => {
                return Err(Error::UnsupportedFormat(format!(
                    "WAV: {:?} at {} bits per sample",
                    format, bits
                )))
            }
        };

        let format = DataFormat::s16(spec.channels as u32, spec.sample_rate);
        let length = reader.duration() as u64;
        debug!(channels = spec.channels, sample_rate = spec.sample_rate, length, "Opened WAV source");

        Ok(Self {
            reader: Some(reader),
            encoding,
            format,
            length,
            cursor: 0,
        })
    }

    fn reader(&mut self) -> Result<&mut WavReader<StreamAdapter<'a>>> {
        self.reader.as_mut().ok_or_else(stream_lost)
    }

    fn next_sample(&mut self) -> Option<Result<i16>> {
        let encoding = self.encoding;
        let reader = match self.reader() {
            Ok(reader) => reader,
            Err(e) => return Some(Err(e)),
        };
        let sample = match encoding {
            Encoding::Int(bits) => reader
                .samples::<i32>()
                .next()?
                .map(|s| int_to_i16(s, bits)),
            Encoding::Float => reader.samples::<f32>().next()?.map(float_to_i16),
        };
        Some(sample.map_err(Error::from))
    }

    /// Re-read the header and position the reader on sample-frame `frame`.
    fn resync(&mut self, frame: u64) -> Result<()> {
        let time = u32::try_from(frame)
            .map_err(|_| Error::InvalidArgs(format!("frame {} out of range", frame)))?;
        let reader = self.reader.take().ok_or_else(stream_lost)?;

        let mut adapter = reader.into_inner();
        adapter.seek_to(0)?;
        let mut reader = WavReader::new(adapter)?;
        reader
            .seek(time)
            .map_err(|e| Error::BadSeek(format!("WAV resync to frame {} failed: {}", frame, e)))?;

        self.reader = Some(reader);
        debug!(frame, "WAV reader resynced");
        Ok(())
    }
}

fn stream_lost() -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::NotConnected,
        "WAV stream lost after a failed resync",
    ))
}

impl DataSource for WavSource<'_> {
    fn read(&mut self, out: &mut [i16], frame_count: u64) -> Result<ReadOutcome> {
        let channels = self.format.channels as usize;
        check_read_request(out, frame_count, self.format.channels)?;

        let wanted = frame_count.min(self.length - self.cursor);
        let mut at_end = wanted < frame_count;
        let mut frames_read = 0u64;
        let mut failure = None;

        'frames: while frames_read < wanted {
            let base = frames_read as usize * channels;
            for slot in out[base..base + channels].iter_mut() {
                match self.next_sample() {
                    Some(Ok(s)) => *slot = s,
                    None => {
                        at_end = true;
                        break 'frames;
                    }
                    Some(Err(e)) => {
                        failure = Some(e);
                        break 'frames;
                    }
                }
            }
            frames_read += 1;
        }

        if let Some(e) = failure {
            // Any partial frame is dropped; resume on the first frame not handed out
            if let Err(resync) = self.resync(self.cursor + frames_read) {
                warn!(error = %resync, "WAV resync after stream failure failed");
            }
            if frames_read == 0 {
                return Err(e);
            }
            warn!(frames_read, error = %e, "Short WAV read after stream failure");
        }

        self.cursor += frames_read;
        Ok(ReadOutcome {
            frames_read,
            at_end,
        })
    }

    fn seek(&mut self, target: u64) -> Result<()> {
        if target > self.length {
            return Err(Error::InvalidArgs(format!(
                "seek target {} is past the end ({} frames)",
                target, self.length
            )));
        }
        let time = u32::try_from(target)
            .map_err(|_| Error::InvalidArgs(format!("seek target {} out of range", target)))?;

        self.reader()?
            .seek(time)
            .map_err(|e| Error::BadSeek(format!("WAV seek to frame {} failed: {}", target, e)))?;
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
