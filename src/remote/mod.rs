//! Remote catalog backend: the network boundary of the catalog.
//!
//! - [`RemoteSource`] - the capability the repository consumes
//! - [`HttpRemote`] - reqwest implementation against the `/api/genres` and `/api/movies` endpoints
//!
//! Nothing in this module caches; every call is exactly one HTTP exchange.

mod client;
mod types;

pub use client::HttpRemote;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::model::{Genre, Movie};

/// Errors that can occur while talking to the catalog backend.
///
/// Transport failures (network, timeout, non-2xx) and decode failures are
/// kept apart so callers can tell a dead link from a broken payload; see
/// [`FetchError::is_transport`] and [`FetchError::is_decode`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// The whole exchange exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// HTTP response with non-2xx status code
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// Response body exceeded the configured size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Connection dropped before Content-Length bytes arrived
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Endpoint URL could not be built from the base URL
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Payload was not the expected JSON shape
    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    /// True for failures of the exchange itself rather than of its payload.
    pub fn is_transport(&self) -> bool {
        !self.is_decode()
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::Decode(_))
    }
}

/// Fetches genre summaries and movie pages from the catalog backend.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Every genre with its movie count. Malformed tuples are skipped, not failed.
    async fn fetch_genres(&self) -> Result<Vec<Genre>, FetchError>;

    /// One window of movies, optionally restricted to a genre.
    async fn fetch_movies(
        &self,
        limit: u32,
        offset: u32,
        genre: Option<&str>,
    ) -> Result<Vec<Movie>, FetchError>;
}
