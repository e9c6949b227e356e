//! Network boundary for the cache controller.
//!
//! ### Fetcher
//! - One trait, [`Fetcher`], performs a single network attempt.
//! - [`HttpFetcher`] implements it with reqwest (rustls, compressed bodies,
//!   bounded redirects, bounded body size).
//!
//! ### Resilience
//! - [`RetryingFetcher`] wraps any fetcher with per-attempt timeouts,
//!   bounded retries and scheduled backoff.
//! - Attempts after the first send `CacheMode::Reload`, which becomes
//!   `Cache-Control: no-cache` on the wire.

pub mod retry;
pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::Instant;

pub use retry::RetryingFetcher;
pub use url::{UrlError, is_same_origin, resolve};

use cyft_core::{AppConfig, CacheMode, Error, Request, Response};

/// A single network attempt.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request, cache_mode: CacheMode) -> Result<Response, Error>;
}

/// Configuration for the HTTP fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "cyft-sw/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 20MB)
    pub max_bytes: usize,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "cyft-sw/0.1".to_string(), max_bytes: 20 * 1024 * 1024, max_redirects: 5 }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), max_bytes: config.max_bytes, max_redirects: config.max_redirects }
    }
}

/// reqwest-backed fetcher.
///
/// Timeouts are left to the caller so that a cancelled attempt is
/// indistinguishable from any other dropped future.
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Translate a request into reqwest. `Reload` forces revalidation end to end.
    fn build_request(&self, request: &Request, cache_mode: CacheMode) -> Result<reqwest::RequestBuilder, Error> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let mut builder = self.http.request(method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if cache_mode == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }
        Ok(builder)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() { Error::FetchTimeout(err.to_string()) } else { Error::Network(err.to_string()) }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request, cache_mode: CacheMode) -> Result<Response, Error> {
        let start = Instant::now();
        let response = self
            .build_request(request, cache_mode)?
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, self.config.max_bytes)));
        }

        let mut headers = std::collections::BTreeMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else { continue };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing: &mut String| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let bytes = response.bytes().await.map_err(map_reqwest_error)?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes, {:?})",
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len(),
            cache_mode
        );

        Ok(Response { status: status.as_u16(), headers, body: bytes })
    }
}
