// src/progress.rs
// Live progress bar for foreground single-file downloads.
//
// The copy loop reports a `TransferState` after every chunk; this turns those
// into an indicatif bar (or a spinner when the size is unknown).

use crate::transfer::{TransferState, ONE_KB, ONE_MB};
use indicatif::{ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{bytes:>10} / {total_bytes} [{wide_bar}] {percent:>3}% {msg}";
const SPINNER_TEMPLATE: &str = "{spinner} {bytes:>10} {msg}";
const BAR_CHARS: &str = "=> ";

pub struct ProgressTracker {
    pb: ProgressBar,
}

impl ProgressTracker {
    // Built from the first progress report: a bar when the total size is
    // known, a spinner otherwise
    pub fn start(state: &TransferState) -> Self {
        let (pb, template) = match state.total_bytes {
            Some(len) => (ProgressBar::new(len), BAR_TEMPLATE),
            None => (ProgressBar::new_spinner(), SPINNER_TEMPLATE),
        };

        // A bad template only costs us the styling, not the download
        if let Ok(style) = ProgressStyle::with_template(template) {
            pb.set_style(style.progress_chars(BAR_CHARS));
        }

        ProgressTracker { pb }
    }

    pub fn update(&self, state: &TransferState) {
        self.pb.set_position(state.bytes_received);
        self.pb.set_message(format_speed(state.current_speed));
    }

    pub fn finish(&self) {
        self.pb.finish();
    }
}

// "12.34 KiB/s" or "1.20 MiB/s"
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= ONE_MB {
        format!("{:.2} MiB/s", bytes_per_sec / ONE_MB)
    } else {
        format!("{:.2} KiB/s", bytes_per_sec / ONE_KB)
    }
}
