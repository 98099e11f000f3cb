//! Decode worker: drains a data source off the caller's thread
//!
//! `read` and `seek` block on I/O. A host that cannot block (a mixer callback,
//! an async task) runs the source on tokio's blocking pool through
//! [`DecodeWorker`] and receives decoded chunks over a bounded channel.
//!
//! **Backpressure:** the worker runs at most `queue_depth` chunks ahead of its
//! consumer. **Stopping:** [`DecodeWorker::stop`] is checked between chunks; a
//! `read` already in progress always completes.

use crate::audio::DataSource;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Interleaved samples handed from the worker to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChunk {
    /// Cursor of the source when this chunk was read
    pub start_frame: u64,
    pub frames: u64,
    pub samples: Vec<i16>,
}

/// Background decoder for one data source.
pub struct DecodeWorker {
    receiver: mpsc::Receiver<DecodedChunk>,
    stop_flag: Arc<AtomicBool>,
    handle: JoinHandle<Result<u64>>,
}

impl DecodeWorker {
    /// Start draining `source` from its current cursor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(mut source: S, chunk_frames: u64, queue_depth: usize) -> Result<Self>
    where
        S: DataSource + 'static,
    {
        if chunk_frames == 0 || queue_depth == 0 {
            return Err(Error::InvalidArgs(format!(
                "worker needs non-zero chunk size and queue depth, got {} / {}",
                chunk_frames, queue_depth
            )));
        }
        let channels = source.data_format().channels as usize;
        let chunk_samples = usize::try_from(chunk_frames)
            .ok()
            .and_then(|frames| frames.checked_mul(channels))
            .ok_or_else(|| {
                Error::InvalidArgs(format!("chunk of {} frames is too large", chunk_frames))
            })?;

        let (sender, receiver) = mpsc::channel(queue_depth);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop_flag);

        info!(
            length = source.length(),
            start = source.cursor(),
            chunk_frames,
            queue_depth,
            "Decode worker starting"
        );

        let handle = tokio::task::spawn_blocking(move || -> Result<u64> {
            let mut total = 0u64;

            while !worker_stop.load(Ordering::Acquire) {
                let start_frame = source.cursor();
                let mut samples = vec![0i16; chunk_samples];
                let outcome = source.read(&mut samples, chunk_frames)?;

                if outcome.frames_read > 0 {
                    samples.truncate(outcome.frames_read as usize * channels);
                    let chunk = DecodedChunk {
                        start_frame,
                        frames: outcome.frames_read,
                        samples,
                    };
                    if sender.blocking_send(chunk).is_err() {
                        debug!(total, "Consumer dropped, decode worker exiting");
                        break;
                    }
                    total += outcome.frames_read;
                }

                if outcome.at_end {
                    break;
                }
            }

            info!(total, "Decode worker finished");
            Ok(total)
        });

        Ok(Self {
            receiver,
            stop_flag,
            handle,
        })
    }

    /// Next decoded chunk, or `None` once the worker has finished.
    pub async fn recv(&mut self) -> Option<DecodedChunk> {
        self.receiver.recv().await
    }

    /// Ask the worker to stop after the chunk it is currently reading.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Wait for the worker and return the frames it delivered.
    ///
    /// Chunks not yet received are discarded. A panic inside the data source
    /// is resumed on the caller.
    pub async fn join(self) -> Result<u64> {
        drop(self.receiver);
        match self.handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(Error::WorkerCancelled(e.to_string())),
        }
    }
}
