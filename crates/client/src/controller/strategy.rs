//! Fetch strategies.
//!
//! | Request | Strategy | Cache |
//! |---|---|---|
//! | navigation | network-first | dynamic |
//! | static asset | cache-first | static |
//! | media asset | cache-first | media |
//! | anything else | network-first | dynamic |
//!
//! Cache-first answers a hit immediately and refreshes the entry in a
//! detached task. Network-first falls back to any cache, then to the offline
//! response. Only OK responses are ever stored.

use serde::Serialize;

use cyft_core::{CacheKind, Error, NamedCache, Request, Response};

use super::CacheController;
use super::background::spawn_detached;
use crate::offline::offline_response;

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    Offline,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Offline => "offline",
        }
    }
}

/// Result of intercepting a request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not handled; the host performs its default fetch.
    Passthrough,
    Respond { response: Response, source: ResponseSource },
}

impl CacheController {
    pub(crate) async fn respond(&self, request: &Request) -> Result<(Response, ResponseSource), Error> {
        if request.is_navigation() {
            return self.network_first(request, CacheKind::Dynamic).await;
        }

        match self.config().rules.classify(request.path()) {
            kind @ (CacheKind::Static | CacheKind::Media) => self.cache_first(request, kind).await,
            CacheKind::Dynamic => self.network_first(request, CacheKind::Dynamic).await,
        }
    }

    async fn cache_first(&self, request: &Request, kind: CacheKind) -> Result<(Response, ResponseSource), Error> {
        let cache = self.db().open_cache(&self.config().names.name(kind)).await?;

        if let Some(cached) = cache.match_request(request).await? {
            tracing::debug!("{} hit for {}", kind, request.url);
            let controller = self.clone();
            let request = request.clone();
            spawn_detached("refresh", async move { controller.fetch_and_cache(&request, &cache).await });
            return Ok((cached, ResponseSource::Cache));
        }

        match self.shared.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    cache.put(request, &response).await?;
                }
                Ok((response, ResponseSource::Network))
            }
            Err(err) => {
                tracing::debug!("{} miss for {} while offline: {}", kind, request.url, err);
                Ok((offline_response(request), ResponseSource::Offline))
            }
        }
    }

    async fn network_first(&self, request: &Request, kind: CacheKind) -> Result<(Response, ResponseSource), Error> {
        match self.shared.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    let cache = self.db().open_cache(&self.config().names.name(kind)).await?;
                    cache.put(request, &response).await?;
                }
                Ok((response, ResponseSource::Network))
            }
            Err(err) => {
                tracing::debug!("network failed for {}: {}", request.url, err);
                match self.db().match_any(request).await? {
                    Some(cached) => Ok((cached, ResponseSource::Cache)),
                    None => Ok((offline_response(request), ResponseSource::Offline)),
                }
            }
        }
    }

    /// Background refresh for a cache-first hit.
    async fn fetch_and_cache(&self, request: &Request, cache: &NamedCache) -> Result<(), Error> {
        let response = self.shared.fetcher.fetch(request).await?;
        if response.is_ok() {
            cache.put(request, &response).await?;
            tracing::debug!("refreshed {} in {}", request.url, cache.name());
        }
        Ok(())
    }
}
