//! # qoads-dec
//!
//! Streaming QOA ("Quite OK Audio") decoding behind a pull-based data-source contract.
//!
//! **Purpose:** Parse a QOA stream, decode it one on-disk frame at a time and
//! serve interleaved 16-bit sample-frames to a host engine at its own pace,
//! with sample-accurate seeking.
//!
//! **Architecture:** `StreamAdapter` (caller's bytes) -> `FrameDecoder` (buffering,
//! cursor, seek) -> `FrameCodec` (per-frame sample reconstruction). WAV and
//! in-memory PCM backends satisfy the same `DataSource` contract; `AudioContext`
//! builds sources from files or registered data.

pub mod audio;
pub mod config;
pub mod context;
pub mod error;
pub mod worker;

pub use audio::{
    Backend, BackendKind, DataFormat, DataSource, FrameDecoder, ReadOutcome, StreamAdapter,
};
pub use context::{AudioContext, DecodedAudio, LoadingMethod};
pub use error::{Error, Result};
pub use worker::{DecodeWorker, DecodedChunk};
