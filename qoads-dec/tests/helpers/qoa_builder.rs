//! Synthetic QOA stream construction
//!
//! Pattern streams ([`qoa_stream`]) use residual codes with scale factor 0 and
//! LMS weights of zero. Even codes (0, 2, 4, 6) dequantize to +1, +3, +5, +7,
//! whose `residual >> 4` is zero, so the weights never move and every decoded
//! sample is exactly `code + 1`. That gives a closed-form reference decode.
//!
//! Random streams ([`random_stream`]) exercise the adaptive path: arbitrary
//! scale factors, codes and LMS state. Check them against
//! [`super::reference_qoa::reference_decode`].

/// Sample-frames in a full QOA frame
pub const QOA_FRAME_LEN: usize = 5120;

const SLICE_LEN: usize = 20;

/// Residual code for a sample-frame index and channel (always even)
pub fn pattern_code(frame: u64, channel: usize) -> u8 {
    (((frame * 3 + channel as u64 * 5) / 7) % 4 * 2) as u8
}

/// Decoded value of an even residual code
pub fn code_value(code: u8) -> i16 {
    code as i16 + 1
}

/// Initial LMS state of one channel: (history, weights)
pub type LmsState = ([i16; 4], [i16; 4]);

/// File header: magic plus total samples per channel
pub fn qoa_file_header(total_frames: u32) -> Vec<u8> {
    let mut bytes = b"qoaf".to_vec();
    bytes.extend_from_slice(&total_frames.to_be_bytes());
    bytes
}

/// One encoded frame with scale factor 0. `code(i, c)` gives the residual code of frame-local sample `i`.
pub fn qoa_frame(
    channels: u8,
    sample_rate: u32,
    samples: u16,
    lms: &[LmsState],
    code: impl Fn(usize, usize) -> u8,
) -> Vec<u8> {
    qoa_frame_scaled(channels, sample_rate, samples, lms, |_, _| 0, code)
}

/// One encoded frame. `scalefactor(s, c)` gives the scale factor of slice `s`
/// of channel `c`, `code(i, c)` the residual code of frame-local sample `i`.
pub fn qoa_frame_scaled(
    channels: u8,
    sample_rate: u32,
    samples: u16,
    lms: &[LmsState],
    scalefactor: impl Fn(usize, usize) -> u8,
    code: impl Fn(usize, usize) -> u8,
) -> Vec<u8> {
    qoa_frame_slices(channels, sample_rate, samples, lms, |s, c| {
        let mut slice = ((scalefactor(s, c) & 0xf) as u64) << 60;
        for i in 0..SLICE_LEN {
            let index = s * SLICE_LEN + i;
            if index < samples as usize {
                slice |= ((code(index, c) & 0x7) as u64) << (57 - 3 * i);
            }
        }
        slice
    })
}

/// One encoded frame whose slice words come straight from `slice(s, c)`.
pub fn qoa_frame_slices(
    channels: u8,
    sample_rate: u32,
    samples: u16,
    lms: &[LmsState],
    mut slice: impl FnMut(usize, usize) -> u64,
) -> Vec<u8> {
    let ch = channels as usize;
    let slices = (samples as usize + SLICE_LEN - 1) / SLICE_LEN;
    let frame_size = 8 + 16 * ch + 8 * slices * ch;

    let mut bytes = Vec::with_capacity(frame_size);
    bytes.push(channels);
    bytes.extend_from_slice(&sample_rate.to_be_bytes()[1..]);
    bytes.extend_from_slice(&samples.to_be_bytes());
    bytes.extend_from_slice(&(frame_size as u16).to_be_bytes());

    for c in 0..ch {
        let (history, weights) = lms.get(c).copied().unwrap_or(([0; 4], [0; 4]));
        for h in history {
            bytes.extend_from_slice(&h.to_be_bytes());
        }
        for w in weights {
            bytes.extend_from_slice(&w.to_be_bytes());
        }
    }

    for s in 0..slices {
        for c in 0..ch {
            bytes.extend_from_slice(&slice(s, c).to_be_bytes());
        }
    }

    assert_eq!(bytes.len(), frame_size);
    bytes
}

/// Deterministic xorshift64 generator
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed | 1)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    /// Uniform in `[-range, range)`
    pub fn next_i16(&mut self, range: i16) -> i16 {
        ((self.next_u64() % (2 * range as u64)) as i64 - range as i64) as i16
    }
}

/// Stream with random LMS state and random slice words (every scale factor and
/// residual code occurs).
pub fn random_stream(channels: u8, sample_rate: u32, frame_lengths: &[u16], seed: u64) -> Vec<u8> {
    let total: u32 = frame_lengths.iter().map(|&n| n as u32).sum();
    let mut bytes = qoa_file_header(total);
    let mut rng = XorShift::new(seed);

    for &len in frame_lengths {
        let lms: Vec<LmsState> = (0..channels)
            .map(|_| {
                let mut history = [0i16; 4];
                let mut weights = [0i16; 4];
                for i in 0..4 {
                    history[i] = rng.next_i16(8192);
                    weights[i] = rng.next_i16(8192);
                }
                (history, weights)
            })
            .collect();
        bytes.extend(qoa_frame_slices(channels, sample_rate, len, &lms, |_, _| rng.next_u64()));
    }
    bytes
}

/// Complete stream whose frames hold `frame_lengths` sample-frames each,
/// encoded with [`pattern_code`] over absolute sample-frame positions.
pub fn qoa_stream(channels: u8, sample_rate: u32, frame_lengths: &[u16]) -> Vec<u8> {
    let total: u32 = frame_lengths.iter().map(|&n| n as u32).sum();
    let mut bytes = qoa_file_header(total);

    let mut start = 0u64;
    for &len in frame_lengths {
        bytes.extend(qoa_frame(channels, sample_rate, len, &[], |i, c| {
            pattern_code(start + i as u64, c)
        }));
        start += len as u64;
    }
    bytes
}

/// Reference decode of [`qoa_stream`] for sample-frames `[from, to)`.
pub fn expected_pattern(channels: usize, from: u64, to: u64) -> Vec<i16> {
    (from..to)
        .flat_map(|frame| (0..channels).map(move |c| code_value(pattern_code(frame, c))))
        .collect()
}

/// A stream of `full_frames` full frames followed by a final frame of `tail` sample-frames.
pub fn qoa_stream_full_frames(channels: u8, sample_rate: u32, full_frames: usize, tail: u16) -> Vec<u8> {
    let mut lengths = vec![QOA_FRAME_LEN as u16; full_frames];
    if tail > 0 {
        lengths.push(tail);
    }
    qoa_stream(channels, sample_rate, &lengths)
}
