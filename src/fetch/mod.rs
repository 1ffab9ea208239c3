// src/fetch/mod.rs
// =============================================================================
// HTTP access for every download mode.
//
// Submodules:
// - http: the `HttpFetch` trait, the reqwest-backed implementation and the
//   error type for failed requests
// - mock: an in-memory website for the tests (test builds only)
// =============================================================================

mod http;

#[cfg(test)]
pub mod mock;

pub use http::{get_success, FetchError, FetchResponse, HttpFetch, ReqwestFetcher};
