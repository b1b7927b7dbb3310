use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use url::Url;

use super::types::{decode_genres, decode_movies};
use super::{FetchError, RemoteSource};
use crate::config::Config;
use crate::model::{Genre, Movie};

/// Upper bound on how much of an error body is kept for the error message.
const MAX_ERROR_BODY: usize = 4 * 1024;

/// HTTP implementation of [`RemoteSource`].
///
/// Each call is a single attempt bounded by `timeout` end to end (connect,
/// headers and body). There is no retry; a failure goes straight back to the
/// repository.
#[derive(Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    max_response_bytes: usize,
}

impl HttpRemote {
    /// Create a client for the backend rooted at `base_url`.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        max_response_bytes: usize,
    ) -> Result<Self, FetchError> {
        let mut base_url = Url::parse(base_url)?;
        // Endpoints are joined relative to the base, which needs a trailing slash
        // to keep any path prefix ("https://host/prefix" + "api/genres").
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .user_agent(concat!("cinedex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
            max_response_bytes,
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            &config.base_url,
            config.request_timeout(),
            config.max_response_bytes,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        Ok(self.base_url.join(path)?)
    }

    /// GET `url` and return the body, bounded by the timeout and size limit.
    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url = %url, "Catalog request");

        let exchange = async {
            let response = self.client.get(url.clone()).send().await?;

            let status = response.status();
            if !status.is_success() {
                let body = read_limited_bytes(response, MAX_ERROR_BODY)
                    .await
                    .map(|b| String::from_utf8_lossy(&b).trim().to_string())
                    .unwrap_or_default();
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            read_limited_bytes(response, self.max_response_bytes).await
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(FetchError::Network(e))) if e.is_timeout() => {
                Err(FetchError::Timeout(self.timeout))
            }
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Catalog request failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(url = %url, timeout = ?self.timeout, "Catalog request timed out");
                Err(FetchError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch_genres(&self) -> Result<Vec<Genre>, FetchError> {
        let url = self.endpoint("api/genres")?;
        let bytes = self.get_bytes(url).await?;
        decode_genres(&bytes)
    }

    async fn fetch_movies(
        &self,
        limit: u32,
        offset: u32,
        genre: Option<&str>,
    ) -> Result<Vec<Movie>, FetchError> {
        let mut url = self.endpoint("api/movies")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &limit.to_string())
                .append_pair("from", &offset.to_string());
            if let Some(genre) = genre.filter(|g| !g.is_empty()) {
                query.append_pair("genre", genre);
            }
        }

        let bytes = self.get_bytes(url).await?;
        decode_movies(&bytes)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
