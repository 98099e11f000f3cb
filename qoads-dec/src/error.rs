//! Error types for qoads-dec
//!
//! Decoder and data-source failures, using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for qoads-dec
#[derive(Error, Debug)]
pub enum Error {
    /// Bad parameters: zero-length request, undersized output, out-of-range seek
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// Stream header missing, truncated or malformed
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// Underlying stream refused to seek
    #[error("Seek failed: {0}")]
    BadSeek(String),

    /// Underlying stream read failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Scratch or decode buffer could not be allocated
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// Natural end of stream; not a failure of the source
    #[error("End of stream")]
    AtEnd,

    /// No registered backend recognises the stream
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Unknown registered data name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Background decode task was cancelled before it finished
    #[error("Decode worker cancelled: {0}")]
    WorkerCancelled(String),
}

impl Error {
    /// True for [`Error::AtEnd`].
    pub fn is_at_end(&self) -> bool {
        matches!(self, Error::AtEnd)
    }
}

impl From<qoads_common::Error> for Error {
    fn from(err: qoads_common::Error) -> Self {
        match err {
            qoads_common::Error::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Error::Io(e),
            hound::Error::FormatError(msg) => Error::InvalidFile(format!("WAV: {}", msg)),
            other => Error::InvalidFile(format!("WAV: {}", other)),
        }
    }
}

/// Convenience Result type using qoads-dec Error
pub type Result<T> = std::result::Result<T, Error>;
