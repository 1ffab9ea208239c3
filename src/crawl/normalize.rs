// src/crawl/normalize.rs
// =============================================================================
// Turns a reference found in a page into an absolute, fragment-free URL and
// decides whether the crawler may follow it.
//
// Rules:
// - References resolve against the page they were found on ("../a", "?q=1",
//   "//host/x" and absolute URLs all work the way a browser resolves them)
// - Fragments are stripped: "/page#top" and "/page" are the same resource
// - Only URLs on the seed's host (and port) are in scope; everything else,
//   including mailto:, javascript: and data: links, is out of scope
// - A reference that cannot be parsed at all is a `MalformedReference`
//
// The scope filter (reject suffixes, exclude prefixes) narrows things further.
// =============================================================================

use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[error("malformed reference '{reference}': {source}")]
pub struct MalformedReference {
    pub reference: String,
    #[source]
    pub source: url::ParseError,
}

/// An absolute, fragment-free URL; the crawler's unit of work.
///
/// Its string form is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    pub fn canonical(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.0.query()
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

/// Result of normalizing one reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    InScope(NormalizedUrl),
    /// Different host (or not a web URL at all); drop it silently
    OutOfScope,
}

/// Resolves references and enforces the same-host scope of one crawl.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    host: String,
    port: Option<u16>,
}

impl UrlNormalizer {
    // The scope is fixed by the seed URL for the whole crawl. Only an
    // explicit port counts: http and https on the same host are one site.
    pub fn new(seed: &Url) -> Self {
        Self {
            host: seed.host_str().unwrap_or_default().to_string(),
            port: seed.port(),
        }
    }

    // Normalizes `reference` as found on the page at `base`
    //
    // Parameters:
    //   base: the absolute URL of the page containing the reference
    //   reference: the raw attribute value (relative or absolute)
    //
    // Returns: InScope(url), OutOfScope, or Err if the reference won't parse
    pub fn normalize(&self, base: &Url, reference: &str) -> Result<Resolution, MalformedReference> {
        let mut resolved = base.join(reference.trim()).map_err(|source| MalformedReference {
            reference: reference.to_string(),
            source,
        })?;
        resolved.set_fragment(None);

        if !self.in_scope(&resolved) {
            return Ok(Resolution::OutOfScope);
        }

        Ok(Resolution::InScope(NormalizedUrl(resolved)))
    }

    fn in_scope(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url.host_str() == Some(self.host.as_str())
            && url.port() == self.port
    }
}

/// Optional constraints on otherwise in-scope URLs.
///
/// A URL whose path ends with a rejected suffix, or starts with an excluded
/// path prefix, is treated exactly like an out-of-scope one.
#[derive(Debug, Clone, Default)]
pub struct ScopeFilter {
    reject_suffixes: Vec<String>,
    exclude_prefixes: Vec<String>,
}

impl ScopeFilter {
    pub fn new(reject_suffixes: Vec<String>, exclude_prefixes: Vec<String>) -> Self {
        // "img" and "/img" both mean the top-level /img directory
        let exclude_prefixes = exclude_prefixes
            .into_iter()
            .map(|p| {
                if p.starts_with('/') {
                    p
                } else {
                    format!("/{}", p)
                }
            })
            .collect();

        Self {
            reject_suffixes,
            exclude_prefixes,
        }
    }

    pub fn allows(&self, url: &NormalizedUrl) -> bool {
        let path = url.path();

        let rejected = self.reject_suffixes.iter().any(|s| path.ends_with(s.as_str()));
        let excluded = self.exclude_prefixes.iter().any(|p| path.starts_with(p.as_str()));

        !rejected && !excluded
    }
}
