// src/crawl/extract.rs
// =============================================================================
// This module finds the resources a fetched HTML page refers to.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, which recovers from broken markup the way
//   browsers do
//
// What counts as a reference:
// - <a href>, <link href>   (pages, stylesheets, icons)
// - <script src>, <img src> (scripts, images)
//
// References come out raw and in document order. Resolving them, scoping
// them and dropping duplicates happens later in the crawl.
//
// Rust concepts:
// - Iterators: the references are produced lazily while walking the tree
// - Lifetimes: the iterator borrows the parsed document
// =============================================================================

use scraper::{Html, Selector};
use thiserror::Error;

// Every element type we pull a reference out of
const REFERENCE_SELECTOR: &str = "a[href], link[href], script[src], img[src]";

/// The page could not be read as HTML; link discovery is skipped for it.
#[derive(Debug, Error)]
#[error("page is not valid UTF-8 HTML: {0}")]
pub struct ParseFailed(#[from] std::str::Utf8Error);

/// A parsed page, ready to hand out its references.
pub struct AssetExtractor {
    document: Html,
    selector: Selector,
}

impl AssetExtractor {
    // Parses raw page bytes
    //
    // html5ever itself never rejects markup, so the only failure is bytes
    // that are not text at all (an image served as text/html, say).
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseFailed> {
        let html = std::str::from_utf8(bytes)?;

        // The selector is a constant and known to be valid
        let selector = Selector::parse(REFERENCE_SELECTOR).unwrap();

        Ok(Self {
            document: Html::parse_document(html),
            selector,
        })
    }

    // Walks the document once, yielding one raw string per matching attribute
    //
    // Example:
    //   <link href="/s.css"><a href="/p2">x</a><img src="a.png">
    //   -> "/s.css", "/p2", "a.png"
    pub fn references(&self) -> impl Iterator<Item = &str> + '_ {
        self.document.select(&self.selector).filter_map(|element| {
            let element = element.value();
            match element.name() {
                "a" | "link" => element.attr("href"),
                "script" | "img" => element.attr("src"),
                _ => None,
            }
        })
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why keep the selector in the struct?
//    - `document.select(&selector)` borrows both the document and the selector
//    - The returned iterator lives as long as `&self`, so both must live in self
//
// 2. Duplicates?
//    - A page may link the same stylesheet ten times; all ten come out here
//    - The crawler's visited set is what guarantees a single fetch
//
// 3. Why `filter_map`?
//    - It maps each element to Option<&str> and drops the Nones in one step
// -----------------------------------------------------------------------------
