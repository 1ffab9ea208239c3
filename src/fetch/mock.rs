// src/fetch/mock.rs
// In-memory website used by the tests in place of the network.
//
// Unknown URLs answer 404. Every request is logged so tests can assert on
// exactly what was (and was not) fetched.

use super::http::{FetchError, FetchResponse, HttpFetch};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

#[derive(Debug, Clone)]
enum Body {
    Ok(Vec<u8>),
    // Sends the bytes, then fails the stream
    BrokenAfter(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Entry {
    status: u16,
    content_type: Option<String>,
    body: Body,
}

#[derive(Debug, Default)]
pub struct MockSite {
    entries: HashMap<String, Entry>,
    unreachable: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, html: &str) -> Self {
        self.with(url, 200, Some("text/html; charset=utf-8"), Body::Ok(html.as_bytes().to_vec()))
    }

    pub fn file(self, url: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.with(url, 200, Some(content_type), Body::Ok(bytes.to_vec()))
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.with(url, status, Some("text/html"), Body::Ok(Vec::new()))
    }

    pub fn broken_body(self, url: &str, sent_before_failure: &[u8]) -> Self {
        self.with(
            url,
            200,
            Some("application/octet-stream"),
            Body::BrokenAfter(sent_before_failure.to_vec()),
        )
    }

    // Fails at the transport level, like a DNS error
    pub fn unreachable(mut self, url: &str) -> Self {
        self.unreachable.push(key(url));
        self
    }

    fn with(mut self, url: &str, status: u16, content_type: Option<&str>, body: Body) -> Self {
        self.entries.insert(
            key(url),
            Entry {
                status,
                content_type: content_type.map(str::to_string),
                body,
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        let url = key(url);
        self.requests().iter().filter(|r| **r == url).count()
    }
}

fn key(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

// Splits a body into small chunks so the copy loop sees more than one
fn chunked(bytes: Vec<u8>) -> Vec<Result<Bytes, FetchError>> {
    bytes
        .chunks(700)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect()
}

impl HttpFetch for MockSite {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if self.unreachable.contains(&url.to_string()) {
            return Err(FetchError::transport(url, "connection refused"));
        }

        let entry = self.entries.get(url.as_str()).cloned().unwrap_or(Entry {
            status: 404,
            content_type: Some("text/html".to_string()),
            body: Body::Ok(b"not found".to_vec()),
        });

        let (content_length, body) = match entry.body {
            Body::Ok(bytes) => (Some(bytes.len() as u64), stream::iter(chunked(bytes)).boxed()),
            Body::BrokenAfter(bytes) => {
                let mut chunks = chunked(bytes);
                chunks.push(Err(FetchError::transport(url, "connection reset")));
                (None, stream::iter(chunks).boxed())
            }
        };

        Ok(FetchResponse {
            status: entry.status,
            content_length,
            content_type: entry.content_type,
            body,
        })
    }
}
