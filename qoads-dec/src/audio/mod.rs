//! Audio decoding
//!
//! Byte-stream adapter, frame codecs, the streaming frame decoder and the
//! data-source backends built on top of them.

pub mod adapter;
pub mod codec;
pub mod frame_decoder;
pub mod pcm;
pub mod source;
pub mod types;
pub mod wav;

pub use adapter::{ReadFn, SeekFn, StreamAdapter, TellFn};
pub use codec::{DecodedFrame, FrameCodec, QoaCodec};
pub use frame_decoder::FrameDecoder;
pub use pcm::PcmSource;
pub use source::{open_backend, probe, Backend, BackendKind, DataSource};
pub use types::{Channel, DataFormat, ReadOutcome, SampleFormat, StreamHeader};
pub use wav::WavSource;
