// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The flags follow wget:
//   rwget https://example.com/file.zip                 single file
//   rwget -O name.zip -P downloads/ <url>              renamed, elsewhere
//   rwget --rate-limit 400K <url>                      throttled
//   rwget -i urls.txt                                  many files at once
//   rwget --mirror -R jpg,gif -X /private <url>        whole site
//   rwget -B <url>                                     in the background
//
// Parsing only; what the flags mean is checked in config.rs.
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "rwget",
    version,
    about = "Download files, lists of files, or whole websites",
    long_about = "rwget downloads a single URL, a list of URLs in parallel (-i), or mirrors a \
                  website (--mirror), optionally throttled with --rate-limit."
)]
pub struct Cli {
    /// URL to download (or the seed URL with --mirror)
    pub url: Option<String>,

    /// Run in the background; output goes to ./wget-log
    #[arg(short = 'B', long = "background")]
    pub background: bool,

    /// Save the download under this file name (single-URL mode)
    #[arg(short = 'O', value_name = "NAME")]
    pub output_name: Option<String>,

    /// Directory to save into (must already exist)
    #[arg(short = 'P', value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Speed limit per download, e.g. 200K or 2M
    #[arg(long = "rate-limit", value_name = "RATE")]
    pub rate_limit: Option<String>,

    /// Download every URL listed in FILE (one per line), concurrently
    #[arg(short = 'i', value_name = "FILE")]
    pub input_file: Option<PathBuf>,

    /// Mirror the whole site reachable from URL on the same host
    #[arg(long)]
    pub mirror: bool,

    /// With --mirror: comma-separated file suffixes to skip (e.g. jpg,gif)
    #[arg(short = 'R', long = "reject", value_name = "LIST")]
    pub reject: Option<String>,

    /// With --mirror: comma-separated path prefixes to skip (e.g. /img,/private)
    #[arg(short = 'X', long = "exclude", value_name = "LIST")]
    pub exclude: Option<String>,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}
