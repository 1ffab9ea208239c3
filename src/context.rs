// src/context.rs
// =============================================================================
// The execution context handed to every download mode.
//
// Instead of global state, each run gets one `RunContext` holding:
// - where human-readable status lines go (stdout, or the background log file)
// - the speed limit for each stream
// - a cancellation token that Ctrl-C triggers
//
// Cloning a context is cheap: the sink is shared behind an Arc<Mutex<..>>, so
// concurrent downloads never interleave half-written lines.
// =============================================================================

use crate::transfer::RateLimit;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Serialized, line-oriented output for status messages.
#[derive(Clone)]
pub struct StatusSink {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl StatusSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    // Appends to `path`, creating it if needed
    pub fn log_file(path: &Path) -> io::Result<Self> {
        let file: File = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }

    /// Writes one whole line.
    ///
    /// A status line that cannot be written is not worth failing a download
    /// over; the error goes to the diagnostics log instead.
    pub fn line(&self, message: impl AsRef<str>) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(out, "{}", message.as_ref()).and_then(|_| out.flush()) {
            tracing::warn!("could not write status line: {}", e);
        }
    }
}

impl std::fmt::Debug for StatusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StatusSink")
    }
}

impl Drop for StatusSink {
    fn drop(&mut self) {
        // Last clone going away: make sure everything reached the file
        if Arc::strong_count(&self.out) == 1 {
            if let Ok(mut out) = self.out.lock() {
                let _ = out.flush();
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunContext {
    pub status: StatusSink,
    pub rate_limit: RateLimit,
    pub cancel: CancellationToken,
    /// True when running detached: no progress bar, just summary lines
    pub background: bool,
}

impl RunContext {
    pub fn new(status: StatusSink, rate_limit: RateLimit, background: bool) -> Self {
        Self {
            status,
            rate_limit,
            cancel: CancellationToken::new(),
            background,
        }
    }
}
