// src/fetch/http.rs
// =============================================================================
// This module is the one place that talks HTTP.
//
// Everything above it (the mirror crawler, the single and multi downloaders)
// only sees the `HttpFetch` trait, so the tests can swap the real network for
// an in-memory site.
//
// Key functionality:
// - GET a URL and hand back status, size, content type and a body stream
// - Turn non-2xx answers into `FetchError::Status`
//
// Rust concepts:
// - Traits: an interface the crawler is generic over
// - impl Future in traits: async methods without a boxing macro
// - Streams: the body arrives chunk by chunk, never fully in memory
// =============================================================================

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors from issuing a request or reading its body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS or mid-body read failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered, but not with a 2xx
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn transport(
        url: &Url,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

// The body of a response, as a stream of chunks
pub type BodyStream = BoxStream<'static, Result<Bytes, FetchError>>;

/// What a GET produced, before the body has been read.
pub struct FetchResponse {
    pub status: u16,
    /// Content-Length, when the server sent one
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub body: BodyStream,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the body should be scanned for links.
    ///
    /// A missing content type is treated as HTML; the extractor simply finds
    /// nothing in non-markup bytes.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            Some(ct) => ct.to_ascii_lowercase().contains("html"),
            None => true,
        }
    }
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Anything that can GET a URL.
///
/// Implementations return `Ok` for every answered request, whatever the
/// status; only transport problems are errors here. Use [`get_success`] to
/// also reject non-2xx answers.
pub trait HttpFetch: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

// Issues a GET and rejects anything that is not a 2xx answer
//
// Parameters:
//   fetcher: the HTTP implementation (real or in-memory)
//   url: the absolute URL to request
//
// Returns: the successful response with its body still unread
pub async fn get_success<F: HttpFetch>(
    fetcher: &F,
    url: &Url,
) -> Result<FetchResponse, FetchError> {
    let response = fetcher.get(url).await?;

    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    Ok(response)
}

/// Production fetcher backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    // Builds the client once; it is reused (and cheaply cloned) for every
    // request so connections get pooled.
    //
    // There is no overall request timeout: a large download may legitimately
    // take hours. Only connecting is bounded.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("rwget/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body_url = url.clone();
        let body = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| FetchError::transport(&body_url, e)))
            .boxed();

        Ok(FetchResponse {
            status,
            content_length,
            content_type,
            body,
        })
    }
}
