// src/download/mod.rs
// =============================================================================
// Downloading whole files: the single-URL mode, the URL-list mode, and the
// "write this response to that path" step the mirror crawler shares.
//
// Submodules:
// - single: one URL with a live progress bar
// - multi: a list of unrelated URLs, all at once
// =============================================================================

mod multi;
mod single;

pub use multi::download_all;
pub use single::download_one;

use crate::context::RunContext;
use crate::fetch::{FetchError, FetchResponse};
use crate::transfer::{copy_stream, TransferError, TransferState};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why one URL could not be saved. Never fatal to the rest of a batch or crawl.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("cannot create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download to {} failed: {source}", path.display())]
    Transfer {
        path: PathBuf,
        #[source]
        source: TransferError,
    },

    #[error("{url} would overwrite {}, already used by another URL in this batch", path.display())]
    DuplicateDestination { url: String, path: PathBuf },
}

// Streams a successful response into a new file at `path`
//
// The parent directory must already exist. On a failed transfer the partial
// file stays where it is.
//
// Returns: number of bytes written
pub async fn save_body<P>(
    ctx: &RunContext,
    response: FetchResponse,
    path: &Path,
    on_progress: P,
) -> Result<u64, DownloadError>
where
    P: FnMut(&TransferState),
{
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|source| DownloadError::Create {
            path: path.to_path_buf(),
            source,
        })?;

    copy_stream(
        response.body,
        &mut file,
        response.content_length,
        ctx.rate_limit,
        &ctx.cancel,
        on_progress,
    )
    .await
    .map_err(|source| DownloadError::Transfer {
        path: path.to_path_buf(),
        source,
    })
}

// File name for a URL in single and multi mode: its last path segment
//
// Examples:
//   https://example.com/a/file.zip?x=1 -> "file.zip"
//   https://example.com/               -> "index.html"
pub fn file_name_from_url(url: &url::Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .filter(|s| *s != "." && *s != "..")
        .map(str::to_string)
        .unwrap_or_else(|| crate::crawl::INDEX_FILE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing;
    use crate::fetch::{get_success, mock::MockSite};
    use url::Url;

    #[test]
    fn test_file_name_from_url() {
        let name = |s: &str| file_name_from_url(&Url::parse(s).unwrap());
        assert_eq!(name("https://example.com/a/b/file.deb"), "file.deb");
        assert_eq!(name("https://example.com/file.zip?token=abc"), "file.zip");
        assert_eq!(name("https://example.com/dir/"), "dir");
        assert_eq!(name("https://example.com/"), "index.html");
        assert_eq!(name("https://example.com"), "index.html");
    }

    #[tokio::test]
    async fn test_save_body_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = testing::context();
        let site = MockSite::new().file("http://example.test/a.bin", "application/octet-stream", &[1u8; 3000]);

        let response = get_success(&site, &Url::parse("http://example.test/a.bin").unwrap())
            .await
            .unwrap();
        let path = dir.path().join("a.bin");
        let written = save_body(&ctx, response, &path, |_| {}).await.unwrap();

        assert_eq!(written, 3000);
        assert_eq!(std::fs::read(&path).unwrap(), vec![1u8; 3000]);
    }

    #[tokio::test]
    async fn test_save_body_leaves_partial_file_on_transfer_error() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = testing::context();
        let site = MockSite::new().broken_body("http://example.test/big.iso", b"first bytes");

        let response = get_success(&site, &Url::parse("http://example.test/big.iso").unwrap())
            .await
            .unwrap();
        let path = dir.path().join("big.iso");
        let err = save_body(&ctx, response, &path, |_| {}).await.unwrap_err();

        assert!(matches!(err, DownloadError::Transfer { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), b"first bytes");
    }

    #[tokio::test]
    async fn test_save_body_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = testing::context();
        let site = MockSite::new().page("http://example.test/", "<p>x</p>");

        let response = get_success(&site, &Url::parse("http://example.test/").unwrap())
            .await
            .unwrap();
        let path = dir.path().join("nope").join("index.html");
        let err = save_body(&ctx, response, &path, |_| {}).await.unwrap_err();

        assert!(matches!(err, DownloadError::Create { .. }));
    }
}
