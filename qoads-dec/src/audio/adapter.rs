//! Byte-stream adapter over caller-supplied read/seek/tell primitives
//!
//! The adapter owns no buffers. It either wraps any `Read + Seek` value (owned,
//! or borrowed through `&mut R`) or a set of callbacks where seek and tell are
//! optional. Decoders that need random access reject an adapter without seek.
//!
//! The adapter tracks its own byte position so `SeekFrom::Current` can be
//! expressed on top of absolute-only seek callbacks.

use crate::error::{Error, Result};
use std::io::{self, Read, Seek, SeekFrom};

/// Read callback: fill the buffer, return bytes read (short only at end of stream)
pub type ReadFn<'a> = Box<dyn FnMut(&mut [u8]) -> io::Result<usize> + Send + 'a>;

/// Seek callback: absolute byte offset from the start of the stream
pub type SeekFn<'a> = Box<dyn FnMut(u64) -> io::Result<()> + Send + 'a>;

/// Tell callback: current absolute byte offset
pub type TellFn<'a> = Box<dyn FnMut() -> io::Result<u64> + Send + 'a>;

/// Combined trait so `Read + Seek` values can be boxed as one trait object.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

enum Inner<'a> {
    Io(Box<dyn ReadSeek + 'a>),
    Callbacks {
        on_read: ReadFn<'a>,
        on_seek: Option<SeekFn<'a>>,
        on_tell: Option<TellFn<'a>>,
    },
}

/// Byte-oriented view of a caller-owned stream.
pub struct StreamAdapter<'a> {
    inner: Inner<'a>,

    /// Bytes from the start of the stream, as observed through this adapter
    position: u64,
}

impl<'a> StreamAdapter<'a> {
    /// Wrap a `Read + Seek` value. Pass `&mut reader` to keep ownership with the caller.
    pub fn new<R: Read + Seek + Send + 'a>(reader: R) -> Self {
        Self {
            inner: Inner::Io(Box::new(reader)),
            position: 0,
        }
    }

    /// Wrap raw callbacks. The stream is assumed to be positioned at byte 0.
    pub fn from_callbacks(
        on_read: ReadFn<'a>,
        on_seek: Option<SeekFn<'a>>,
        on_tell: Option<TellFn<'a>>,
    ) -> Self {
        Self {
            inner: Inner::Callbacks {
                on_read,
                on_seek,
                on_tell,
            },
            position: 0,
        }
    }

    /// Whether the underlying stream supports seeking.
    pub fn can_seek(&self) -> bool {
        match &self.inner {
            Inner::Io(_) => true,
            Inner::Callbacks { on_seek, .. } => on_seek.is_some(),
        }
    }

    /// Read until `buf` is full or the stream ends. Returns bytes read.
    pub fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_once(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(filled)
    }

    /// Seek to an absolute byte offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        let result = match &mut self.inner {
            Inner::Io(io) => io.seek(SeekFrom::Start(offset)).map(|_| ()),
            Inner::Callbacks { on_seek, .. } => match on_seek {
                Some(seek) => seek(offset),
                None => {
                    return Err(Error::InvalidArgs(
                        "stream has no seek callback".to_string(),
                    ))
                }
            },
        };

        result.map_err(|e| Error::BadSeek(format!("seek to byte {} failed: {}", offset, e)))?;
        self.position = offset;
        Ok(())
    }

    /// Current byte offset, from the tell primitive when there is one.
    pub fn tell(&mut self) -> Result<u64> {
        match &mut self.inner {
            Inner::Io(io) => Ok(io.stream_position()?),
            Inner::Callbacks {
                on_tell: Some(tell),
                ..
            } => Ok(tell()?),
            Inner::Callbacks { on_tell: None, .. } => Ok(self.position),
        }
    }

    fn read_once(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = match &mut self.inner {
            Inner::Io(io) => io.read(buf)?,
            Inner::Callbacks { on_read, .. } => on_read(buf)?,
        };
        self.position += n as u64;
        Ok(n)
    }
}

impl Read for StreamAdapter<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_once(buf)
    }
}

impl Seek for StreamAdapter<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if let Inner::Io(io) = &mut self.inner {
            let offset = io.seek(pos)?;
            self.position = offset;
            return Ok(offset);
        }

        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "seek callbacks are absolute from start only",
                ))
            }
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream")
        })?;

        self.seek_to(target).map_err(|e| match e {
            Error::Io(io) => io,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        })?;
        Ok(target)
    }
}
