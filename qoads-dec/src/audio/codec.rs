//! Frame codecs: container header parsing and per-frame sample reconstruction
//!
//! A [`FrameCodec`] is stateless: every encoded frame carries what it needs to
//! be decoded on its own, so the frame decoder can jump to any frame boundary.
//! [`QoaCodec`] implements the "Quite OK Audio" reference decode.
//!
//! QOA byte layout (all values big-endian):
//!
//! ```text
//! file header   "qoaf" | u32 samples per channel
//! frame header  u8 channels | u24 sample rate | u16 samples in frame | u16 frame size
//! lms state     per channel: 4 x i16 history, 4 x i16 weights
//! slices        per 20 samples, per channel: u64 = 4-bit scale factor + 20 x 3-bit residual
//! ```

use super::types::StreamHeader;
use crate::error::{Error, Result};

/// Outcome of decoding one encoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedFrame {
    /// Sample-frames written to the output; zero means no more decodable data
    pub frames: usize,

    /// Encoded bytes the frame occupied
    pub consumed: usize,
}

impl DecodedFrame {
    pub const EMPTY: DecodedFrame = DecodedFrame {
        frames: 0,
        consumed: 0,
    };
}

/// A container whose audio is stored as independently decodable frames.
pub trait FrameCodec: Send {
    /// Bytes to read from the start of the stream to parse the header.
    fn header_len(&self) -> usize;

    /// Parse the container header from the first `header_len()` bytes.
    fn parse_header(&self, bytes: &[u8]) -> Result<StreamHeader>;

    /// Sample-frames held by every full (non-final) encoded frame.
    fn frame_len(&self) -> u64;

    /// Largest possible encoded frame for `channels`, in bytes.
    ///
    /// Every non-final frame has exactly this size, which is what makes
    /// frame-index seeking possible.
    fn max_frame_size(&self, channels: u32) -> usize;

    /// Decode the frame at the start of `encoded` into interleaved samples.
    ///
    /// Returns [`DecodedFrame::EMPTY`] when no complete, valid frame is present.
    fn decode_frame(&self, encoded: &[u8], header: &StreamHeader, out: &mut [i16]) -> DecodedFrame;
}

pub const QOA_MAGIC: u32 = u32::from_be_bytes(*b"qoaf");
pub const QOA_MIN_FILESIZE: usize = 16;
pub const QOA_MAX_CHANNELS: u32 = 8;
pub const QOA_SLICE_LEN: usize = 20;
pub const QOA_SLICES_PER_FRAME: usize = 256;
pub const QOA_FRAME_LEN: usize = QOA_SLICES_PER_FRAME * QOA_SLICE_LEN;
pub const QOA_LMS_LEN: usize = 4;

const QOA_FILE_HEADER_SIZE: usize = 8;
const QOA_FRAME_HEADER_SIZE: usize = 8;
const QOA_LMS_STATE_SIZE: usize = QOA_LMS_LEN * 4;

const QOA_DEQUANT_TAB: [[i32; 8]; 16] = [
    [1, -1, 3, -3, 5, -5, 7, -7],
    [5, -5, 18, -18, 32, -32, 49, -49],
    [16, -16, 53, -53, 95, -95, 147, -147],
    [34, -34, 113, -113, 203, -203, 315, -315],
    [63, -63, 210, -210, 378, -378, 588, -588],
    [104, -104, 345, -345, 621, -621, 966, -966],
    [158, -158, 528, -528, 950, -950, 1477, -1477],
    [228, -228, 760, -760, 1368, -1368, 2128, -2128],
    [316, -316, 1053, -1053, 1895, -1895, 2947, -2947],
    [422, -422, 1405, -1405, 2529, -2529, 3934, -3934],
    [548, -548, 1828, -1828, 3290, -3290, 5117, -5117],
    [696, -696, 2320, -2320, 4176, -4176, 6496, -6496],
    [868, -868, 2893, -2893, 5207, -5207, 8099, -8099],
    [1064, -1064, 3548, -3548, 6386, -6386, 9933, -9933],
    [1286, -1286, 4288, -4288, 7718, -7718, 12005, -12005],
    [1536, -1536, 5120, -5120, 9216, -9216, 14336, -14336],
];

/// Byte size of a frame holding `slices` slices per channel.
pub fn qoa_frame_size(channels: u32, slices: usize) -> usize {
    let channels = channels as usize;
    QOA_FRAME_HEADER_SIZE + QOA_LMS_STATE_SIZE * channels + 8 * slices * channels
}

#[derive(Debug, Clone, Copy, Default)]
struct Lms {
    history: [i32; QOA_LMS_LEN],
    weights: [i32; QOA_LMS_LEN],
}

impl Lms {
    fn predict(&self) -> i32 {
        let mut prediction = 0i32;
        for i in 0..QOA_LMS_LEN {
            prediction = prediction.wrapping_add(self.weights[i].wrapping_mul(self.history[i]));
        }
        prediction >> 13
    }

    fn update(&mut self, sample: i32, residual: i32) {
        let delta = residual >> 4;
        for i in 0..QOA_LMS_LEN {
            let step = if self.history[i] < 0 { -delta } else { delta };
            self.weights[i] = self.weights[i].wrapping_add(step);
        }
        self.history.copy_within(1.., 0);
        self.history[QOA_LMS_LEN - 1] = sample;
    }
}

fn read_u64(bytes: &[u8], pos: &mut usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[*pos..*pos + 8]);
    *pos += 8;
    u64::from_be_bytes(word)
}

/// Reference QOA frame codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct QoaCodec;

impl FrameCodec for QoaCodec {
    fn header_len(&self) -> usize {
        QOA_MIN_FILESIZE
    }

    fn parse_header(&self, bytes: &[u8]) -> Result<StreamHeader> {
        if bytes.len() < QOA_MIN_FILESIZE {
            return Err(Error::InvalidFile(format!(
                "QOA header needs {} bytes, got {}",
                QOA_MIN_FILESIZE,
                bytes.len()
            )));
        }

        let mut pos = 0;
        let file_header = read_u64(bytes, &mut pos);
        if (file_header >> 32) as u32 != QOA_MAGIC {
            return Err(Error::InvalidFile("missing 'qoaf' magic".to_string()));
        }

        let samples = file_header & 0xffff_ffff;
        if samples == 0 {
            return Err(Error::InvalidFile(
                "streaming QOA (zero total samples) is not supported".to_string(),
            ));
        }

        // The first frame header carries the stream's channel count and rate
        let frame_header = read_u64(bytes, &mut pos);
        let channels = ((frame_header >> 56) & 0xff) as u32;
        let sample_rate = ((frame_header >> 32) & 0xff_ffff) as u32;

        if channels == 0 || channels > QOA_MAX_CHANNELS {
            return Err(Error::InvalidFile(format!("unsupported channel count {}", channels)));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidFile("sample rate is zero".to_string()));
        }

        Ok(StreamHeader {
            channel_count: channels,
            sample_rate,
            total_sample_frames: samples,
            first_frame_byte_offset: QOA_FILE_HEADER_SIZE as u64,
        })
    }

    fn frame_len(&self) -> u64 {
        QOA_FRAME_LEN as u64
    }

    fn max_frame_size(&self, channels: u32) -> usize {
        qoa_frame_size(channels, QOA_SLICES_PER_FRAME)
    }

    fn decode_frame(&self, encoded: &[u8], header: &StreamHeader, out: &mut [i16]) -> DecodedFrame {
        let stream_channels = header.channel_count as usize;
        if encoded.len() < QOA_FRAME_HEADER_SIZE + QOA_LMS_STATE_SIZE * stream_channels {
            return DecodedFrame::EMPTY;
        }

        let mut pos = 0;
        let frame_header = read_u64(encoded, &mut pos);
        let channels = ((frame_header >> 56) & 0xff) as usize;
        let sample_rate = ((frame_header >> 32) & 0xff_ffff) as u32;
        let samples = ((frame_header >> 16) & 0xffff) as usize;
        let frame_size = (frame_header & 0xffff) as usize;

        if channels != stream_channels || sample_rate != header.sample_rate {
            return DecodedFrame::EMPTY;
        }

        // Every slice this frame claims must fit inside both the frame and the input
        let slices_per_channel = (samples + QOA_SLICE_LEN - 1) / QOA_SLICE_LEN;
        let needed = qoa_frame_size(header.channel_count, slices_per_channel);
        if frame_size > encoded.len() || needed > frame_size || samples * channels > out.len() {
            return DecodedFrame::EMPTY;
        }

        let mut lms = [Lms::default(); QOA_MAX_CHANNELS as usize];
        for state in lms.iter_mut().take(channels) {
            let mut history = read_u64(encoded, &mut pos);
            let mut weights = read_u64(encoded, &mut pos);
            for i in 0..QOA_LMS_LEN {
                state.history[i] = (history >> 48) as i16 as i32;
                history <<= 16;
                state.weights[i] = (weights >> 48) as i16 as i32;
                weights <<= 16;
            }
        }

        let mut sample_index = 0;
        while sample_index < samples {
            for (c, state) in lms.iter_mut().enumerate().take(channels) {
                let mut slice = read_u64(encoded, &mut pos);
                let scalefactor = ((slice >> 60) & 0xf) as usize;
                slice <<= 4;

                let slice_start = sample_index * channels + c;
                let slice_end = (sample_index + QOA_SLICE_LEN).min(samples) * channels + c;

                for si in (slice_start..slice_end).step_by(channels) {
                    let predicted = state.predict();
                    let quantized = ((slice >> 61) & 0x7) as usize;
                    let dequantized = QOA_DEQUANT_TAB[scalefactor][quantized];
                    let reconstructed = predicted
                        .wrapping_add(dequantized)
                        .clamp(i16::MIN as i32, i16::MAX as i32);

                    out[si] = reconstructed as i16;
                    slice <<= 3;
                    state.update(reconstructed, dequantized);
                }
            }
            sample_index += QOA_SLICE_LEN;
        }

        DecodedFrame {
            frames: samples,
            consumed: pos,
        }
    }
}
