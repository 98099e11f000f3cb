//! Error injection streams
//!
//! Readers and adapters that fail in controlled ways, for testing how the
//! decoder surfaces I/O and seek failures.

use qoads_dec::StreamAdapter;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Reader whose reads fail once its position reaches `fail_at`.
///
/// Failure is persistent: every read at or past `fail_at` errors, until a seek
/// moves the position back before it.
pub struct FailingReader {
    inner: Cursor<Vec<u8>>,
    fail_at: u64,
}

impl FailingReader {
    pub fn new(bytes: Vec<u8>, fail_at: u64) -> Self {
        Self {
            inner: Cursor::new(bytes),
            fail_at,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.inner.position();
        if pos >= self.fail_at {
            return Err(io::Error::new(io::ErrorKind::Other, "injected read failure"));
        }
        let allowed = ((self.fail_at - pos) as usize).min(buf.len());
        self.inner.read(&mut buf[..allowed])
    }
}

impl Seek for FailingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Reader that fails a single read: the first one starting at or past `fail_at`.
///
/// Reads before `fail_at` are cut short at it, so the failure lands exactly on
/// that byte. Every read after the failure succeeds.
pub struct FailOnceReader {
    inner: Cursor<Vec<u8>>,
    fail_at: u64,
    failed: bool,
}

impl FailOnceReader {
    pub fn new(bytes: Vec<u8>, fail_at: u64) -> Self {
        Self {
            inner: Cursor::new(bytes),
            fail_at,
            failed: false,
        }
    }
}

impl Read for FailOnceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pos = self.inner.position();
        if self.failed {
            return self.inner.read(buf);
        }
        if pos >= self.fail_at {
            self.failed = true;
            return Err(io::Error::new(io::ErrorKind::Other, "injected transient failure"));
        }
        let allowed = ((self.fail_at - pos) as usize).min(buf.len());
        self.inner.read(&mut buf[..allowed])
    }
}

impl Seek for FailOnceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Reader that reports `ErrorKind::Interrupted` before every successful read.
pub struct InterruptingReader {
    inner: Cursor<Vec<u8>>,
    interrupt_next: bool,
}

impl InterruptingReader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            inner: Cursor::new(bytes),
            interrupt_next: true,
        }
    }
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt_next {
            self.interrupt_next = false;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        self.interrupt_next = true;
        self.inner.read(buf)
    }
}

impl Seek for InterruptingReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Callback adapter over `bytes` without a seek primitive.
pub fn unseekable_adapter(bytes: Vec<u8>) -> StreamAdapter<'static> {
    let mut cursor = Cursor::new(bytes);
    StreamAdapter::from_callbacks(Box::new(move |buf: &mut [u8]| cursor.read(buf)), None, None)
}

/// Callback adapter whose seeks succeed `ok_seeks` times, then always fail.
///
/// The returned counter reports how many seeks were attempted.
pub fn seek_failing_adapter(
    bytes: Vec<u8>,
    ok_seeks: usize,
) -> (StreamAdapter<'static>, Arc<AtomicUsize>) {
    let shared = Arc::new(Mutex::new(Cursor::new(bytes)));
    let attempts = Arc::new(AtomicUsize::new(0));

    let read_side = Arc::clone(&shared);
    let seek_side = Arc::clone(&shared);
    let seek_attempts = Arc::clone(&attempts);

    let adapter = StreamAdapter::from_callbacks(
        Box::new(move |buf: &mut [u8]| read_side.lock().unwrap().read(buf)),
        Some(Box::new(move |offset: u64| {
            let n = seek_attempts.fetch_add(1, Ordering::SeqCst);
            if n >= ok_seeks {
                return Err(io::Error::new(io::ErrorKind::Other, "injected seek failure"));
            }
            seek_side.lock().unwrap().set_position(offset);
            Ok(())
        })),
        None,
    );
    (adapter, attempts)
}
