// src/transfer/copier.rs
// =============================================================================
// Copies a response body into a file, 1 KiB at a time, under a rate limit.
//
// How it works:
// 1. Pull the next chunk from the body stream (or stop if cancelled)
// 2. Write it to the sink in CHUNK_SIZE pieces
// 3. After every piece: update the transfer state, throttle if too fast,
//    and report progress
// 4. End of stream = done; any read or write error aborts the copy
//
// A failed copy leaves whatever was already written on disk.
// =============================================================================

use super::limiter::{RateLimit, RateLimiter};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub const CHUNK_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("error while reading: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("error while writing: {0}")]
    Write(#[source] std::io::Error),

    #[error("transfer cancelled")]
    Cancelled,
}

/// Live numbers for one stream, handed to the progress callback.
#[derive(Debug, Clone)]
pub struct TransferState {
    pub bytes_received: u64,
    /// `None` when the server did not announce a size
    pub total_bytes: Option<u64>,
    pub started_at: Instant,
    pub current_speed: f64,
}

impl TransferState {
    fn new(total_bytes: Option<u64>, started_at: Instant) -> Self {
        Self {
            bytes_received: 0,
            total_bytes,
            started_at,
            current_speed: 0.0,
        }
    }
}

// Copies `source` into `sink`, returning the number of bytes written
//
// Parameters:
//   source: the body stream (any error type is accepted and kept as the cause)
//   sink: where the bytes go, usually a tokio::fs::File
//   total_bytes: announced size, only used for progress
//   limit: speed limit for this stream
//   cancel: aborts the copy between chunks when triggered
//   on_progress: called after every chunk written
pub async fn copy_stream<S, E, W, P>(
    mut source: S,
    sink: &mut W,
    total_bytes: Option<u64>,
    limit: RateLimit,
    cancel: &CancellationToken,
    mut on_progress: P,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
    W: AsyncWrite + Unpin,
    P: FnMut(&TransferState),
{
    let limiter = RateLimiter::start(limit);
    let mut state = TransferState::new(total_bytes, limiter.started_at());

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            next = source.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => return Err(TransferError::Read(e.into())),
            None => break,
        };

        for piece in chunk.chunks(CHUNK_SIZE) {
            sink.write_all(piece).await.map_err(TransferError::Write)?;

            state.bytes_received += piece.len() as u64;

            if limiter.is_over_limit(state.bytes_received) {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                    _ = limiter.throttle(state.bytes_received) => {}
                }
            }

            // Infinite while no time has passed yet
            let speed = limiter.average_speed(state.bytes_received);
            state.current_speed = if speed.is_finite() { speed } else { 0.0 };

            on_progress(&state);
        }
    }

    sink.flush().await.map_err(TransferError::Write)?;

    Ok(state.bytes_received)
}
