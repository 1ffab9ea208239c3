// src/download/single.rs
// =============================================================================
// Downloads one URL into one file, the default mode.
//
// In the foreground the user gets status lines and a live progress bar; when
// running detached (-B) the bar is replaced by a single average-speed line so
// the log file stays readable.
// =============================================================================

use super::{file_name_from_url, save_body, DownloadError};
use crate::context::RunContext;
use crate::fetch::{get_success, HttpFetch};
use crate::progress::{format_speed, ProgressTracker};
use chrono::Local;
use indicatif::HumanBytes;
use std::path::{Path, PathBuf};
use url::Url;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Downloads `url` into `dest_dir`
//
// Parameters:
//   fetcher: HTTP implementation
//   ctx: status output, rate limit, cancellation
//   url: the URL to download
//   dest_dir: existing directory to save into
//   name: file name to use instead of the URL's last segment
//
// Returns: the path the file was saved to
pub async fn download_one<F: HttpFetch>(
    fetcher: &F,
    ctx: &RunContext,
    url: &str,
    dest_dir: &Path,
    name: Option<&str>,
) -> Result<PathBuf, DownloadError> {
    let url = Url::parse(url).map_err(|source| DownloadError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let status = &ctx.status;

    status.line(format!("start at {}", Local::now().format(TIME_FORMAT)));
    status.line(format!("sending request to {}, awaiting response...", url));

    let response = get_success(fetcher, &url).await?;
    status.line(format!("status {} OK", response.status));

    match response.content_length {
        Some(len) => status.line(format!("content size: {} [{}]", len, HumanBytes(len))),
        None => status.line("content size: unknown"),
    }

    let file_name = match name {
        Some(name) => name.to_string(),
        None => file_name_from_url(&url),
    };
    let path = dest_dir.join(file_name);
    status.line(format!("saving file to: {}", path.display()));

    // The bar appears with the first chunk; none at all when detached
    let mut tracker: Option<ProgressTracker> = None;
    // Kept for the background summary
    let mut last_state = None;

    let result = save_body(ctx, response, &path, |state| {
        if !ctx.background {
            tracker
                .get_or_insert_with(|| ProgressTracker::start(state))
                .update(state);
        }
        last_state = Some(state.clone());
    })
    .await;

    if let Some(tracker) = &tracker {
        tracker.finish();
    }

    let written = result?;

    if let (true, Some(state)) = (ctx.background, last_state) {
        let elapsed = state.started_at.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            status.line(format!(
                "average speed: {}",
                format_speed(state.bytes_received as f64 / elapsed)
            ));
        }
    }
    status.line(format!("Downloaded [{}] ({})", url, HumanBytes(written)));
    status.line(format!("finished at {}", Local::now().format(TIME_FORMAT)));

    Ok(path)
}
