//! Single outbound retrieval of a remote page or image.
//!
//! The [`Fetcher`] trait is the seam between the two subsystems and the
//! network: the gallery cache fetches the shared album page through it, the
//! credential composer fetches subject photos through it. Tests swap in a
//! scripted mock (see `test_helpers::MockFetcher`) so neither subsystem needs
//! a live host.
//!
//! Every call is exactly one GET with a bounded total timeout. There are no
//! retries here: callers own their fallback policy (stale cache, placeholder
//! photo).

use bytes::{Bytes, BytesMut};
use reqwest::{Client, Url};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::HttpConfig;

/// Classified failure of a single fetch.
///
/// `Clone` so a failed refresh can be reported to every caller that was
/// waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected HTTP status {code}")]
    HttpStatus { code: u16 },
    #[error("response body exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

impl FetchError {
    /// Whether the same request could succeed if tried again later.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Network(_) => true,
            FetchError::HttpStatus { code } => *code == 429 || (500..600).contains(code),
            FetchError::InvalidUrl { .. } | FetchError::TooLarge { .. } => false,
        }
    }
}

/// Retrieves the full body of an absolute URL, or a classified failure.
///
/// Implementations must never return a partial body as success.
pub trait Fetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Bytes, FetchError>> + Send;
}

impl<F: Fetcher> Fetcher for Arc<F> {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Bytes, FetchError>> + Send {
        (**self).fetch(url, timeout)
    }
}

/// Parse `url` and require an absolute `http`/`https` URL with a host.
pub fn parse_absolute_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    Ok(parsed)
}

/// [`Fetcher`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    /// Build a client from the `[http]` config section.
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config.max_body_bytes))
    }

    /// Use an existing client, e.g. to share a pool with other components.
    pub fn with_client(client: Client, max_body_bytes: usize) -> Self {
        Self {
            client,
            max_body_bytes,
        }
    }

    fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::Network(err.to_string())
        }
    }

    async fn get(&self, url: Url, timeout: Duration) -> Result<Bytes, FetchError> {
        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                code: status.as_u16(),
            });
        }

        let limit = self.max_body_bytes;
        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(FetchError::TooLarge { limit });
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Self::classify(e, timeout))?
        {
            if body.len() + chunk.len() > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Bytes, FetchError> {
        let parsed = parse_absolute_url(url)?;
        debug!(url = %parsed, ?timeout, "fetching");
        // reqwest's per-request timeout covers the body; the outer bound also
        // covers DNS stalls that happen before the request is dispatched.
        tokio::time::timeout(timeout, self.get(parsed, timeout))
            .await
            .map_err(|_| FetchError::Timeout(timeout))?
    }
}
