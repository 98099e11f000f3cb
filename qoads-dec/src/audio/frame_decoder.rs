//! Streaming frame decoder
//!
//! Pull-based decoder over a [`StreamAdapter`]: the host asks for N interleaved
//! sample-frames and the decoder serves them from the most recently decoded
//! on-disk frame, refilling one frame at a time.
//!
//! **Buffers:** both scratch buffers are allocated once at construction and
//! sized from the header. `encoded` holds one maximum-size on-disk frame;
//! `decoded` holds `channels x frame_len x 2` samples. Memory held by a decoder
//! does not depend on the stream length or the size of any read request.
//!
//! **Seeking:** lands on the on-disk frame containing the target, then discards
//! the leading sample-frames of that frame after it is decoded. Every non-final
//! frame is exactly `max_frame_size` bytes, so the frame's byte offset is a
//! multiplication.

use super::adapter::StreamAdapter;
use super::codec::{FrameCodec, QoaCodec};
use super::types::{check_read_request, DataFormat, ReadOutcome, StreamHeader};
use crate::error::{Error, Result};
use std::io::{self, Read};
use tracing::{debug, warn};

/// Streaming decoder for frame-based containers (QOA by default).
pub struct FrameDecoder<'a, C: FrameCodec = QoaCodec> {
    adapter: StreamAdapter<'a>,
    codec: C,
    header: StreamHeader,

    /// Sample-frames per full on-disk frame
    frame_len: u64,
    max_frame_size: usize,

    /// Encoded scratch, `max_frame_size` bytes; `encoded_len` are valid
    encoded: Vec<u8>,
    encoded_len: usize,

    /// Decoded interleaved samples; `decoded_len` sample-frames are valid
    decoded: Vec<i16>,
    decoded_len: u64,
    decoded_pos: u64,

    /// Sample-frames to drop from the next decoded frame (set by seek)
    pending_skip: u64,

    /// Logical cursor in sample-frames
    sample_position: u64,
}

impl<'a> FrameDecoder<'a, QoaCodec> {
    /// Open a QOA stream. The adapter must support seeking.
    pub fn new(adapter: StreamAdapter<'a>) -> Result<Self> {
        Self::with_codec(adapter, QoaCodec)
    }
}

impl<'a, C: FrameCodec> FrameDecoder<'a, C> {
    /// Open a stream with an explicit frame codec.
    pub fn with_codec(mut adapter: StreamAdapter<'a>, codec: C) -> Result<Self> {
        if !adapter.can_seek() {
            return Err(Error::InvalidArgs(
                "frame decoder requires a seekable stream".to_string(),
            ));
        }

        let frame_len = codec.frame_len();
        if frame_len == 0 {
            return Err(Error::InvalidArgs("codec frame length is zero".to_string()));
        }

        let mut header_bytes = vec![0u8; codec.header_len()];
        let n = adapter.read_full(&mut header_bytes)?;
        let header = codec.parse_header(&header_bytes[..n])?;

        adapter.seek_to(header.first_frame_byte_offset)?;

        let max_frame_size = codec.max_frame_size(header.channel_count);
        let decoded_samples = (header.channel_count as u64)
            .checked_mul(frame_len)
            .and_then(|n| n.checked_mul(2))
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                Error::OutOfMemory(format!(
                    "decoded buffer for {} channels overflows",
                    header.channel_count
                ))
            })?;

        let encoded = alloc_buffer::<u8>(max_frame_size, "encoded frame")?;
        let decoded = alloc_buffer::<i16>(decoded_samples, "decoded sample")?;

        debug!(
            channels = header.channel_count,
            sample_rate = header.sample_rate,
            total_frames = header.total_sample_frames,
            max_frame_size,
            "Opened frame decoder"
        );

        Ok(Self {
            adapter,
            codec,
            header,
            frame_len,
            max_frame_size,
            encoded,
            encoded_len: 0,
            decoded,
            decoded_len: 0,
            decoded_pos: 0,
            pending_skip: 0,
            sample_position: 0,
        })
    }

    /// Read up to `frame_count` interleaved sample-frames into `out`.
    ///
    /// A short read with `at_end` set means the stream is exhausted. If the
    /// underlying stream fails after some frames were produced, those frames
    /// are returned and the failure surfaces on the next call.
    pub fn read(&mut self, out: &mut [i16], frame_count: u64) -> Result<ReadOutcome> {
        let channels = self.header.channel_count as u64;
        check_read_request(out, frame_count, self.header.channel_count)?;

        let remaining = self.header.total_sample_frames - self.sample_position;
        let wanted = frame_count.min(remaining);
        let mut at_end = wanted < frame_count;
        let mut frames_read = 0u64;

        while frames_read < wanted {
            if self.decoded_pos >= self.decoded_len {
                match self.refill() {
                    Ok(true) => continue,
                    Ok(false) => {
                        at_end = true;
                        break;
                    }
                    Err(e) if frames_read > 0 => {
                        warn!(frames_read, error = %e, "Short read after stream failure");
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }

            let n = (self.decoded_len - self.decoded_pos).min(wanted - frames_read);
            let src = (self.decoded_pos * channels) as usize;
            let dst = (frames_read * channels) as usize;
            let len = (n * channels) as usize;
            out[dst..dst + len].copy_from_slice(&self.decoded[src..src + len]);

            self.decoded_pos += n;
            frames_read += n;
        }

        self.sample_position += frames_read;
        Ok(ReadOutcome {
            frames_read,
            at_end,
        })
    }

    /// Move the cursor to `target` sample-frames from the start.
    ///
    /// All-or-nothing: if the underlying seek fails the decoder is unchanged.
    pub fn seek(&mut self, target: u64) -> Result<()> {
        let total = self.header.total_sample_frames;
        if target > total {
            return Err(Error::InvalidArgs(format!(
                "seek target {} is past the end ({} frames)",
                target, total
            )));
        }

        let frame_index = (target / self.frame_len).min(total / self.frame_len);
        let skip = target - frame_index * self.frame_len;
        let offset = frame_index
            .checked_mul(self.max_frame_size as u64)
            .and_then(|bytes| bytes.checked_add(self.header.first_frame_byte_offset))
            .ok_or_else(|| {
                Error::InvalidArgs(format!("seek target {} overflows byte offset", target))
            })?;

        self.adapter.seek_to(offset)?;

        self.encoded_len = 0;
        self.decoded_len = 0;
        self.decoded_pos = 0;
        self.pending_skip = skip;
        self.sample_position = target;

        debug!(target_frame = target, frame_index, skip, offset, "Seek");
        Ok(())
    }

    pub fn data_format(&self) -> DataFormat {
        self.header.data_format()
    }

    /// Current position in sample-frames.
    pub fn cursor(&self) -> u64 {
        self.sample_position
    }

    /// Total length in sample-frames.
    pub fn length(&self) -> u64 {
        self.header.total_sample_frames
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    /// Bytes held by the scratch buffers.
    pub fn buffer_bytes(&self) -> usize {
        self.encoded.capacity() + self.decoded.capacity() * std::mem::size_of::<i16>()
    }

    /// Decode the next on-disk frame. Returns false when no more frames decode.
    fn refill(&mut self) -> Result<bool> {
        self.fill_encoded()?;

        let frame = self.codec.decode_frame(
            &self.encoded[..self.encoded_len],
            &self.header,
            &mut self.decoded,
        );
        if frame.frames == 0 {
            self.decoded_len = 0;
            self.decoded_pos = 0;
            debug!(position = self.sample_position, "No further frames decode");
            return Ok(false);
        }

        // Keep any bytes past this frame for the next decode
        let consumed = frame.consumed.min(self.encoded_len);
        self.encoded.copy_within(consumed..self.encoded_len, 0);
        self.encoded_len -= consumed;

        self.decoded_len = frame.frames as u64;
        self.decoded_pos = self.pending_skip.min(self.decoded_len);
        self.pending_skip = 0;
        Ok(true)
    }

    /// Top the encoded scratch up to one maximum-size frame.
    fn fill_encoded(&mut self) -> Result<()> {
        while self.encoded_len < self.encoded.len() {
            match self.adapter.read(&mut self.encoded[self.encoded_len..]) {
                Ok(0) => break,
                Ok(n) => self.encoded_len += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(())
    }
}

fn alloc_buffer<T: Copy + Default>(len: usize, what: &str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        Error::OutOfMemory(format!("{} buffer of {} elements: {}", what, len, e))
    })?;
    buf.resize(len, T::default());
    Ok(buf)
}
