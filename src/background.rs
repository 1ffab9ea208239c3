// src/background.rs
// =============================================================================
// Running detached (-B).
//
// The foreground process re-launches itself with the same arguments, a
// marker in the environment, and stdout/stderr pointed at ./wget-log; then it
// exits. The child sees the marker and does the actual work, so every status
// line and warning lands in the log file.
// =============================================================================

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::process::{Command, Stdio};

pub const LOG_FILE: &str = "wget-log";

const CHILD_MARKER: &str = "RWGET_IN_BACKGROUND";

// True inside the re-launched child
pub fn is_child() -> bool {
    std::env::var_os(CHILD_MARKER).is_some()
}

// Starts the background child and returns its process id
pub fn detach() -> Result<u32> {
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("cannot open {}", LOG_FILE))?;

    let exe = std::env::current_exe().context("cannot locate own executable")?;

    let child = Command::new(exe)
        .args(std::env::args_os().skip(1))
        .env(CHILD_MARKER, "1")
        .stdin(Stdio::null())
        .stdout(log.try_clone()?)
        .stderr(log)
        .spawn()
        .context("background start failed")?;

    Ok(child.id())
}
