// src/transfer/mod.rs
// =============================================================================
// Streaming a response body to disk.
//
// Submodules:
// - limiter: the `RateLimit` setting and the per-stream `RateLimiter`
// - copier: the chunked copy loop shared by every download mode
// =============================================================================

mod copier;
mod limiter;

pub use copier::{copy_stream, TransferError, TransferState};
pub use limiter::{InvalidRateLimit, RateLimit, ONE_KB, ONE_MB};
