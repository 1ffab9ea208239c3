// src/crawl/queue.rs
// =============================================================================
// This module mirrors a website, depth-first, one URL at a time.
//
// How it works:
// 1. Start with the seed URL on the work stack
// 2. Pop a reference and normalize it against the page it came from
// 3. Drop it if it is out of scope, malformed, filtered, or already visited
// 4. Mark it visited, GET it, and stream the body to its local path
// 5. If it was HTML, read the saved file back and push every reference it
//    contains onto the stack
// 6. Repeat until the stack is empty (or Ctrl-C cancels the run)
//
// A failure on one URL (network error, 404, disk full) is logged and
// recorded in the report; the crawl carries on with the rest.
//
// Rust concepts:
// - Vec as a stack: push()/pop() give depth-first order
// - Generics: the crawler works with any `HttpFetch`, real or in-memory
// - Ownership: the crawler owns its stack and visited set, nothing is shared
// =============================================================================

use super::extract::AssetExtractor;
use super::normalize::{NormalizedUrl, Resolution, ScopeFilter, UrlNormalizer};
use super::path::map_to_path;
use super::visited::VisitedSet;
use crate::context::RunContext;
use crate::download::{save_body, DownloadError};
use crate::fetch::{get_success, HttpFetch};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

// A reference waiting to be processed, with the page it was found on
#[derive(Debug, Clone)]
struct CrawlTarget {
    raw: String,
    base: Url,
}

/// What to mirror and where to put it.
#[derive(Debug, Clone)]
pub struct MirrorOptions {
    pub seed: Url,
    /// Directory the site is saved under, usually `<dest>/<host>`
    pub root: PathBuf,
    pub filter: ScopeFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedResource {
    pub url: String,
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedResource {
    pub url: String,
    pub error: String,
}

/// Summary of one mirror run.
#[derive(Debug, Default, Serialize)]
pub struct MirrorReport {
    pub saved: Vec<SavedResource>,
    pub failed: Vec<FailedResource>,
    /// References skipped because they pointed off-site
    pub out_of_scope: usize,
    /// References skipped by the reject / exclude lists
    pub filtered: usize,
    pub malformed: usize,
    pub cancelled: bool,
}

impl MirrorReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

// Mirrors the site at `options.seed` into `options.root`
//
// Parameters:
//   fetcher: HTTP implementation used for every request
//   ctx: status output, rate limit and cancellation for this run
//   options: seed URL, destination root and scope filter
//
// Returns: a report of what was saved, what failed and what was skipped
pub async fn mirror_site<F: HttpFetch>(
    fetcher: &F,
    ctx: &RunContext,
    options: MirrorOptions,
) -> MirrorReport {
    let mut crawler = MirrorCrawler::new(fetcher, ctx, options);
    crawler.run().await;
    crawler.report
}

struct MirrorCrawler<'a, F> {
    fetcher: &'a F,
    ctx: &'a RunContext,
    root: PathBuf,
    normalizer: UrlNormalizer,
    filter: ScopeFilter,
    visited: VisitedSet,
    stack: Vec<CrawlTarget>,
    report: MirrorReport,
}

impl<'a, F: HttpFetch> MirrorCrawler<'a, F> {
    fn new(fetcher: &'a F, ctx: &'a RunContext, options: MirrorOptions) -> Self {
        let seed = CrawlTarget {
            raw: options.seed.to_string(),
            base: options.seed.clone(),
        };

        Self {
            fetcher,
            ctx,
            root: options.root,
            normalizer: UrlNormalizer::new(&options.seed),
            filter: options.filter,
            visited: VisitedSet::new(),
            stack: vec![seed],
            report: MirrorReport::default(),
        }
    }

    async fn run(&mut self) {
        while let Some(target) = self.stack.pop() {
            if self.ctx.cancel.is_cancelled() {
                warn!("mirror cancelled with {} reference(s) left", self.stack.len() + 1);
                self.report.cancelled = true;
                break;
            }

            let Some(url) = self.admit(&target) else {
                continue;
            };

            self.visit(url).await;
        }

        info!(
            "mirror finished: {} saved, {} failed, {} visited",
            self.report.saved.len(),
            self.report.failed.len(),
            self.visited.len()
        );
    }

    // Decides whether a discovered reference gets fetched, marking it visited
    // if so. Returns None for anything that must be dropped.
    fn admit(&mut self, target: &CrawlTarget) -> Option<NormalizedUrl> {
        let url = match self.normalizer.normalize(&target.base, &target.raw) {
            Ok(Resolution::InScope(url)) => url,
            Ok(Resolution::OutOfScope) => {
                debug!("out of scope: {}", target.raw);
                self.report.out_of_scope += 1;
                return None;
            }
            Err(e) => {
                debug!("{}", e);
                self.report.malformed += 1;
                return None;
            }
        };

        if self.visited.contains(&url) {
            return None;
        }

        if !self.filter.allows(&url) {
            debug!("filtered: {}", url);
            self.report.filtered += 1;
            return None;
        }

        // Marked before the request goes out, so a rediscovery can never
        // lead to a second fetch
        self.visited.mark(&url);
        Some(url)
    }

    async fn visit(&mut self, url: NormalizedUrl) {
        debug!("fetching {}", url);

        let (saved, is_html) = match self.fetch_and_save(&url).await {
            Ok(result) => result,
            Err(e) => {
                warn!("skipping {}: {}", url, e);
                self.report.failed.push(FailedResource {
                    url: url.to_string(),
                    error: e.to_string(),
                });
                return;
            }
        };

        self.ctx
            .status
            .line(format!("saved {} -> {}", url, saved.path.display()));

        if is_html {
            let discovered = discover_references(&saved.path).await;
            debug!("{} reference(s) on {}", discovered.len(), url);

            // Reversed so the first reference on the page is processed first
            for raw in discovered.into_iter().rev() {
                self.stack.push(CrawlTarget {
                    raw,
                    base: url.as_url().clone(),
                });
            }
        }

        self.report.saved.push(saved);
    }

    async fn fetch_and_save(
        &self,
        url: &NormalizedUrl,
    ) -> Result<(SavedResource, bool), DownloadError> {
        let response = get_success(self.fetcher, url.as_url()).await?;
        let is_html = response.is_html();

        let path = map_to_path(&self.root, url)
            .await
            .map_err(|source| DownloadError::Create {
                path: super::path::local_path(&self.root, url),
                source,
            })?;

        let bytes = save_body(self.ctx, response, &path, |_| {}).await?;

        Ok((
            SavedResource {
                url: url.to_string(),
                path,
                bytes,
            },
            is_html,
        ))
    }
}

// Reads a saved page back and lists the references in it
//
// A page that cannot be read or parsed yields nothing; it stays saved.
async fn discover_references(path: &Path) -> Vec<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("cannot read back {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match AssetExtractor::parse(&bytes) {
        Ok(extractor) => extractor.references().map(str::to_string).collect(),
        Err(e) => {
            debug!("{}: {}", path.display(), e);
            Vec::new()
        }
    }
}
