// src/config.rs
// =============================================================================
// Turns raw command-line flags into a validated run configuration.
//
// Everything that can be wrong with the user's input is caught here, before
// any network activity:
// - a rate limit that isn't "<number>K" or "<number>M"
// - a destination directory that doesn't exist
// - a URL list file that can't be read or has no URLs in it
// - a missing or unusable URL
//
// The result picks exactly one download mode.
// =============================================================================

use crate::cli::Cli;
use crate::crawl::{MirrorOptions, ScopeFilter};
use crate::transfer::{InvalidRateLimit, RateLimit};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    InvalidRateLimit(#[from] InvalidRateLimit),

    #[error("destination directory {} does not exist", .0.display())]
    MissingDestination(PathBuf),

    #[error("cannot read URL list {}: {source}", path.display())]
    UrlList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("URL list {} contains no URLs", .0.display())]
    EmptyUrlList(PathBuf),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("'{0}' is not an http(s) URL with a host")]
    UnsupportedUrl(String),

    #[error("no URL given (usage: rwget [OPTIONS] <URL>, or -i <FILE>)")]
    MissingUrl,
}

/// The one thing this run does.
#[derive(Debug, Clone)]
pub enum Mode {
    Single { url: String, name: Option<String> },
    Mirror(MirrorOptions),
    Multi { urls: Vec<String> },
}

/// Settings shared by every mode.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dest_dir: PathBuf,
    pub rate_limit: RateLimit,
    pub background: bool,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub settings: Settings,
}

impl Config {
    // Validates `cli`; -i wins over --mirror, which wins over single mode
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let rate_limit: RateLimit = cli.rate_limit.as_deref().unwrap_or("").parse()?;
        let dest_dir = destination(cli.directory.as_deref())?;

        let mode = if let Some(list) = &cli.input_file {
            Mode::Multi {
                urls: read_url_list(list)?,
            }
        } else {
            let url = cli.url.clone().ok_or(ConfigError::MissingUrl)?;

            if cli.mirror {
                let seed = parse_web_url(&url)?;
                // parse_web_url guarantees a host
                let host = seed.host_str().unwrap_or_default().to_string();

                Mode::Mirror(MirrorOptions {
                    root: dest_dir.join(host),
                    seed,
                    filter: ScopeFilter::new(
                        split_list(cli.reject.as_deref()),
                        split_list(cli.exclude.as_deref()),
                    ),
                })
            } else {
                Mode::Single {
                    url,
                    name: cli.output_name.clone(),
                }
            }
        };

        Ok(Config {
            mode,
            settings: Settings {
                dest_dir,
                rate_limit,
                background: cli.background,
                json: cli.json,
            },
        })
    }
}

// The -P directory must exist; without -P we save to the current directory
fn destination(dir: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match dir {
        None => Ok(PathBuf::from(".")),
        Some(dir) if dir.is_dir() => Ok(dir.to_path_buf()),
        Some(dir) => Err(ConfigError::MissingDestination(dir.to_path_buf())),
    }
}

fn parse_web_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::UnsupportedUrl(raw.to_string()));
    }

    Ok(url)
}

// "jpg, gif,,png" -> ["jpg", "gif", "png"]
pub fn split_list(list: Option<&str>) -> Vec<String> {
    list.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// One URL per non-blank line
pub fn read_url_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::UrlList {
        path: path.to_path_buf(),
        source,
    })?;

    let urls: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(ConfigError::EmptyUrlList(path.to_path_buf()));
    }

    Ok(urls)
}
