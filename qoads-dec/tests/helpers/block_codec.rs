//! Minimal frame codec with tiny frames, for exercising seek arithmetic densely
//!
//! Layout:
//! ```text
//! header  "blk1" | u32 channels | u32 sample rate | u32 total frames
//! frame   u16 sample-frames (1..=4) | n x channels x i16 samples
//! ```
//! All values big-endian. Every frame except the last holds 4 sample-frames.

use qoads_dec::audio::{DecodedFrame, FrameCodec, StreamHeader};
use qoads_dec::{Error, Result};

pub const BLOCK_FRAME_LEN: u64 = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockCodec;

impl FrameCodec for BlockCodec {
    fn header_len(&self) -> usize {
        16
    }

    fn parse_header(&self, bytes: &[u8]) -> Result<StreamHeader> {
        if bytes.len() < 16 || &bytes[..4] != b"blk1" {
            return Err(Error::InvalidFile("not a blk1 stream".to_string()));
        }
        let word = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Ok(StreamHeader {
            channel_count: word(4),
            sample_rate: word(8),
            total_sample_frames: word(12) as u64,
            first_frame_byte_offset: 16,
        })
    }

    fn frame_len(&self) -> u64 {
        BLOCK_FRAME_LEN
    }

    fn max_frame_size(&self, channels: u32) -> usize {
        2 + BLOCK_FRAME_LEN as usize * channels as usize * 2
    }

    fn decode_frame(&self, encoded: &[u8], header: &StreamHeader, out: &mut [i16]) -> DecodedFrame {
        if encoded.len() < 2 {
            return DecodedFrame::EMPTY;
        }
        let frames = u16::from_be_bytes([encoded[0], encoded[1]]) as usize;
        let samples = frames * header.channel_count as usize;
        let size = 2 + samples * 2;
        if frames == 0 || frames > BLOCK_FRAME_LEN as usize || encoded.len() < size {
            return DecodedFrame::EMPTY;
        }

        for (i, pair) in encoded[2..size].chunks_exact(2).enumerate() {
            out[i] = i16::from_be_bytes([pair[0], pair[1]]);
        }
        DecodedFrame {
            frames,
            consumed: size,
        }
    }
}

/// Sample value at a sample-frame position and channel
pub fn block_value(frame: u64, channel: usize) -> i16 {
    (frame * 8 + channel as u64) as i16
}

/// Stream of `total` sample-frames encoded with [`block_value`]
pub fn block_stream(channels: u32, sample_rate: u32, total: u32) -> Vec<u8> {
    let mut bytes = b"blk1".to_vec();
    bytes.extend_from_slice(&channels.to_be_bytes());
    bytes.extend_from_slice(&sample_rate.to_be_bytes());
    bytes.extend_from_slice(&total.to_be_bytes());

    let mut frame = 0u64;
    while frame < total as u64 {
        let n = (total as u64 - frame).min(BLOCK_FRAME_LEN);
        bytes.extend_from_slice(&(n as u16).to_be_bytes());
        for f in frame..frame + n {
            for c in 0..channels as usize {
                bytes.extend_from_slice(&block_value(f, c).to_be_bytes());
            }
        }
        frame += n;
    }
    bytes
}

/// Reference decode of [`block_stream`] for sample-frames `[from, to)`
pub fn expected_block(channels: usize, from: u64, to: u64) -> Vec<i16> {
    (from..to)
        .flat_map(|frame| (0..channels).map(move |c| block_value(frame, c)))
        .collect()
}
