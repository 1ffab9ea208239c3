// src/crawl/visited.rs
// The ledger of URLs the crawler has already fetched (or is about to).
//
// It only ever grows during a run, and `mark` is check-and-insert in one step:
// the crawler fetches a URL only when `mark` returns true, which is what makes
// "at most one fetch per URL" hold no matter how often a URL is rediscovered.

use super::normalize::NormalizedUrl;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url`; returns false if it was already there.
    pub fn mark(&mut self, url: &NormalizedUrl) -> bool {
        self.seen.insert(url.canonical().to_string())
    }

    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.seen.contains(url.canonical())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}
