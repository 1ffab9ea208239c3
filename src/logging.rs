// src/logging.rs
// Diagnostics setup for tracing events.
//
// Events always go to stderr; in a background run the child's stderr is the
// log file, so warnings end up next to the status lines. Level comes from
// RUST_LOG (default "warn,rwget=info").

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,rwget=info";

pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
