// src/download/multi.rs
// =============================================================================
// Downloads a list of unrelated URLs concurrently (-i urls.txt).
//
// How it works:
// 1. Work out each URL's destination file name up front
// 2. Spawn one tokio task per URL; each does GET -> create file -> copy
// 3. Wait for all of them and report one outcome per URL, in input order
//
// One failing URL never stops the others: the outcome list says exactly
// which ones made it. Two URLs that would write the same file name are not
// both downloaded; the later one fails with `DuplicateDestination`.
//
// Rust concepts:
// - Arc: the fetcher is shared by every task
// - JoinSet: owns the spawned tasks and hands back their results
// =============================================================================

use super::{file_name_from_url, save_body, DownloadError};
use crate::context::RunContext;
use crate::fetch::{get_success, HttpFetch};
use indicatif::HumanBytes;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Result for one URL of the batch.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub url: String,
    pub result: Result<PathBuf, DownloadError>,
}

impl DownloadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

// JSON-friendly view for --json style summaries
#[derive(Debug, Serialize)]
pub struct OutcomeSummary<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn summary(&self) -> OutcomeSummary<'_> {
        match &self.result {
            Ok(path) => OutcomeSummary {
                url: &self.url,
                path: Some(path),
                error: None,
            },
            Err(e) => OutcomeSummary {
                url: &self.url,
                path: None,
                error: Some(e.to_string()),
            },
        }
    }
}

// A URL checked and assigned its destination, or already failed
enum Planned {
    Ready(Url, PathBuf),
    Rejected(DownloadError),
}

// Validates every URL and assigns destination paths, first come first served
fn plan(urls: &[String], dest_dir: &Path) -> Vec<Planned> {
    let mut claimed = HashSet::new();

    urls.iter()
        .map(|raw| {
            let url = match Url::parse(raw) {
                Ok(url) => url,
                Err(source) => {
                    return Planned::Rejected(DownloadError::InvalidUrl {
                        url: raw.clone(),
                        source,
                    })
                }
            };

            let path = dest_dir.join(file_name_from_url(&url));
            if !claimed.insert(path.clone()) {
                return Planned::Rejected(DownloadError::DuplicateDestination {
                    url: raw.clone(),
                    path,
                });
            }

            Planned::Ready(url, path)
        })
        .collect()
}

// Downloads every URL in `urls` into `dest_dir`, all at the same time
//
// Parameters:
//   fetcher: shared HTTP implementation
//   ctx: status output, per-stream rate limit, cancellation
//   urls: the URLs, as read from the list file
//   dest_dir: existing directory to save into
//
// Returns: one outcome per input URL, in input order
pub async fn download_all<F>(
    fetcher: Arc<F>,
    ctx: &RunContext,
    urls: &[String],
    dest_dir: &Path,
) -> Vec<DownloadOutcome>
where
    F: HttpFetch + 'static,
{
    let mut results: Vec<Option<Result<PathBuf, DownloadError>>> =
        urls.iter().map(|_| None).collect();
    let mut tasks = JoinSet::new();

    for (index, planned) in plan(urls, dest_dir).into_iter().enumerate() {
        let (url, path) = match planned {
            Planned::Ready(url, path) => (url, path),
            Planned::Rejected(e) => {
                results[index] = Some(Err(e));
                continue;
            }
        };

        let fetcher = Arc::clone(&fetcher);
        let ctx = ctx.clone();

        tasks.spawn(async move {
            let result = download_to(&*fetcher, &ctx, &url, &path).await;
            (index, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            // Tasks don't panic on download errors; if one does, its slot
            // stays empty and is reported below
            Err(e) => tracing::error!("download task failed: {}", e),
        }
    }

    urls.iter()
        .zip(results)
        .map(|(url, result)| DownloadOutcome {
            url: url.clone(),
            result: result.unwrap_or_else(|| {
                Err(DownloadError::Create {
                    path: dest_dir.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "download task panicked"),
                })
            }),
        })
        .collect()
}

async fn download_to<F: HttpFetch>(
    fetcher: &F,
    ctx: &RunContext,
    url: &Url,
    path: &Path,
) -> Result<PathBuf, DownloadError> {
    let result = async {
        let response = get_success(fetcher, url).await?;
        save_body(ctx, response, path, |_| {}).await
    }
    .await;

    match &result {
        Ok(bytes) => ctx
            .status
            .line(format!("Downloaded: {} ({})", path.display(), HumanBytes(*bytes))),
        Err(e) => ctx.status.line(format!("Failed: {}: {}", url, e)),
    }

    result.map(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing;
    use crate::fetch::mock::MockSite;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_one_failure_does_not_sink_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, output) = testing::context();
        let site = Arc::new(
            MockSite::new()
                .file("http://example.test/one.txt", "text/plain", b"one")
                .status("http://example.test/two.txt", 404)
                .file("http://example.test/three.txt", "text/plain", b"three"),
        );

        let outcomes = download_all(
            site,
            &ctx,
            &urls(&[
                "http://example.test/one.txt",
                "http://example.test/two.txt",
                "http://example.test/three.txt",
            ]),
            dir.path(),
        )
        .await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1].result, Err(DownloadError::Fetch(_))));
        assert!(outcomes[2].is_ok());
        assert_eq!(outcomes.iter().filter(|o| !o.is_ok()).count(), 1);

        assert_eq!(std::fs::read(dir.path().join("one.txt")).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join("three.txt")).unwrap(), b"three");
        assert!(!dir.path().join("two.txt").exists());

        let log = output.contents();
        assert_eq!(log.lines().filter(|l| l.starts_with("Downloaded: ")).count(), 2);
        assert_eq!(log.lines().filter(|l| l.starts_with("Failed: ")).count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = testing::context();
        let site = Arc::new(
            MockSite::new()
                .file("http://a.test/pkg.deb", "application/octet-stream", b"from a")
                .file("http://b.test/pkg.deb", "application/octet-stream", b"from b"),
        );

        let outcomes = download_all(
            Arc::clone(&site),
            &ctx,
            &urls(&["http://a.test/pkg.deb", "http://b.test/pkg.deb"]),
            dir.path(),
        )
        .await;

        assert!(outcomes[0].is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(DownloadError::DuplicateDestination { .. })
        ));
        assert_eq!(std::fs::read(dir.path().join("pkg.deb")).unwrap(), b"from a");
        assert_eq!(site.request_count("http://b.test/pkg.deb"), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported_per_url() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _) = testing::context();
        let site = Arc::new(MockSite::new().file("http://example.test/ok.txt", "text/plain", b"ok"));

        let outcomes = download_all(
            site,
            &ctx,
            &urls(&["::not a url::", "http://example.test/ok.txt"]),
            dir.path(),
        )
        .await;

        assert!(matches!(outcomes[0].result, Err(DownloadError::InvalidUrl { .. })));
        assert!(outcomes[1].is_ok());
    }

    #[test]
    fn test_summary_serializes() {
        let outcome = DownloadOutcome {
            url: "http://example.test/x".to_string(),
            result: Ok(PathBuf::from("x")),
        };
        let json = serde_json::to_string(&outcome.summary()).unwrap();
        assert_eq!(json, r#"{"url":"http://example.test/x","path":"x"}"#);
    }
}
