//! Sample-frame and wall-clock time conversions

use std::time::Duration;

/// Convert a sample-frame count to a duration at `sample_rate`.
///
/// A zero sample rate yields `Duration::ZERO`.
pub fn frames_to_duration(frames: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    let nanos = frames as u128 * 1_000_000_000 / sample_rate as u128;
    Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
}

/// Convert a duration to the sample-frame index it starts at (rounded down).
pub fn duration_to_frames(duration: Duration, sample_rate: u32) -> u64 {
    let frames = duration.as_nanos() * sample_rate as u128 / 1_000_000_000;
    frames.min(u64::MAX as u128) as u64
}

/// Convert milliseconds to a sample-frame index (rounded down).
pub fn millis_to_frames(millis: u64, sample_rate: u32) -> u64 {
    duration_to_frames(Duration::from_millis(millis), sample_rate)
}

/// Format a sample-frame position as `M:SS.mmm`.
pub fn format_frames(frames: u64, sample_rate: u32) -> String {
    let total_ms = frames_to_duration(frames, sample_rate).as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}
