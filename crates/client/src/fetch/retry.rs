//! Bounded retry with per-attempt timeout and scheduled backoff.

use std::sync::Arc;

use cyft_core::{CacheMode, Error, Request, Response, RetryPolicy};

use super::Fetcher;

/// Wraps a [`Fetcher`] with a [`RetryPolicy`].
///
/// A non-OK status is retried while attempts remain, but returned as-is on
/// the final attempt so the caller sees the real upstream answer.
#[derive(Clone)]
pub struct RetryingFetcher {
    inner: Arc<dyn Fetcher>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn Fetcher>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// One timeout-guarded attempt, no retries.
    pub async fn fetch_once(&self, request: &Request) -> Result<Response, Error> {
        self.attempt(request, CacheMode::Default).await
    }

    /// Fetch with retries.
    ///
    /// Returns the first OK response, or the final attempt's response
    /// whatever its status. Network failures on the final attempt propagate.
    pub async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let mut attempt = 0;
        loop {
            let cache_mode = if attempt == 0 { CacheMode::Default } else { CacheMode::Reload };
            let result = match self.attempt(request, cache_mode).await {
                Ok(response) if !response.is_ok() && !self.policy.is_final(attempt) => {
                    Err(Error::HttpStatus(response.status))
                }
                other => other,
            };

            match result {
                Ok(response) => return Ok(response),
                Err(err) if self.policy.is_final(attempt) => {
                    tracing::debug!("giving up on {} after {} attempts: {}", request.url, attempt + 1, err);
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        url = %request.url,
                        attempt = attempt + 1,
                        attempts = self.policy.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "fetch failed, retrying: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Dropping the inner future on timeout cancels the in-flight request.
    async fn attempt(&self, request: &Request, cache_mode: CacheMode) -> Result<Response, Error> {
        let timeout = self.policy.timeout();
        match tokio::time::timeout(timeout, self.inner.fetch(request, cache_mode)).await {
            Ok(result) => result,
            Err(_) => Err(Error::FetchTimeout(format!("{} after {}ms", request.url, timeout.as_millis()))),
        }
    }
}
