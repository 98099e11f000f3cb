//! Reference QOA decode
//!
//! Straight-line decode of a whole stream, written from the format description
//! and sharing nothing with the crate's codec. The dequantization table is
//! derived from the scale factor curve rather than spelled out, so a typo in
//! either table shows up as a mismatch.
//!
//! Arithmetic wraps at 32 bits, as the crate's predictor does; random LMS
//! weights can drift far enough to overflow.

const SLICE_LEN: usize = 20;

const SCALEFACTORS: [f64; 16] = [
    1.0, 7.0, 21.0, 45.0, 84.0, 138.0, 211.0, 304.0, 421.0, 562.0, 731.0, 928.0, 1157.0,
    1419.0, 1715.0, 2048.0,
];

const DEQUANT_STEPS: [f64; 8] = [0.75, -0.75, 2.5, -2.5, 4.5, -4.5, 7.0, -7.0];

/// Residual for a scale factor and 3-bit code, rounded half away from zero
pub fn dequantize(scalefactor: usize, code: usize) -> i32 {
    (SCALEFACTORS[scalefactor] * DEQUANT_STEPS[code]).round() as i32
}

fn be_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

fn be_u64(bytes: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[at..at + 8]);
    u64::from_be_bytes(word)
}

/// Decode every frame of a complete QOA stream to interleaved samples.
pub fn reference_decode(bytes: &[u8]) -> Vec<i16> {
    assert_eq!(&bytes[..4], b"qoaf");
    let total = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    let mut out = Vec::new();
    let mut at = 8;
    let mut decoded = 0;
    while decoded < total {
        let channels = bytes[at] as usize;
        let samples = be_u16(bytes, at + 4) as usize;
        let frame_size = be_u16(bytes, at + 6) as usize;
        let frame = &bytes[at..at + frame_size];

        let mut history = vec![[0i32; 4]; channels];
        let mut weights = vec![[0i32; 4]; channels];
        for c in 0..channels {
            let base = 8 + 16 * c;
            for k in 0..4 {
                history[c][k] = be_u16(frame, base + 2 * k) as i16 as i32;
                weights[c][k] = be_u16(frame, base + 8 + 2 * k) as i16 as i32;
            }
        }

        let slices_at = 8 + 16 * channels;
        let mut pcm = vec![0i16; samples * channels];
        for s in 0..(samples + SLICE_LEN - 1) / SLICE_LEN {
            for c in 0..channels {
                let slice = be_u64(frame, slices_at + 8 * (s * channels + c));
                let scalefactor = (slice >> 60) as usize;
                let h = &mut history[c];
                let w = &mut weights[c];

                for i in 0..SLICE_LEN {
                    let n = s * SLICE_LEN + i;
                    if n >= samples {
                        break;
                    }
                    let code = ((slice >> (57 - 3 * i)) & 0x7) as usize;
                    let residual = dequantize(scalefactor, code);

                    let mut prediction = 0i32;
                    for k in 0..4 {
                        prediction = prediction.wrapping_add(w[k].wrapping_mul(h[k]));
                    }
                    let sample = (prediction >> 13).wrapping_add(residual).clamp(-32768, 32767);
                    pcm[n * channels + c] = sample as i16;

                    let delta = residual >> 4;
                    for k in 0..4 {
                        w[k] = w[k].wrapping_add(if h[k] < 0 { -delta } else { delta });
                    }
                    h.rotate_left(1);
                    h[3] = sample;
                }
            }
        }

        out.extend(pcm);
        decoded += samples;
        at += frame_size;
    }
    out
}
