// src/crawl/mod.rs
// =============================================================================
// This module handles website mirroring.
//
// Features:
// - Depth-first crawl starting from a seed URL
// - Same-host restriction (never leaves the seed's host)
// - Every resource fetched at most once per run
// - Optional reject-suffix / exclude-path filters
// - Pages, stylesheets, scripts and images saved under a local tree that
//   mirrors the URL paths
//
// Submodules:
// - normalize: URL resolution and scope checks
// - path: URL -> local file path
// - visited: the dedup ledger
// - extract: reference discovery in HTML
// - queue: the crawl loop itself
// =============================================================================

mod extract;
mod normalize;
mod path;
mod queue;
mod visited;

pub use normalize::ScopeFilter;
pub use path::INDEX_FILE;
pub use queue::{mirror_site, MirrorOptions};
