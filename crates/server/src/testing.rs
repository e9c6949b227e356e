//! Fixed-response fetcher and controller setup for tool tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::CallToolResult;

use cyft_client::{CacheController, Fetcher, WorkerConfig};
use cyft_core::{CacheDb, CacheMode, Error, Request, Response, RetryPolicy};

pub(crate) const ORIGIN: &str = "https://cyft.example";

/// Answers by path; unknown paths fail as if the network were down.
#[derive(Default)]
pub(crate) struct FixedFetcher {
    routes: HashMap<String, Response>,
}

impl FixedFetcher {
    pub(crate) fn with(mut self, path: &str, response: Response) -> Self {
        self.routes.insert(path.to_string(), response);
        self
    }
}

#[async_trait]
impl Fetcher for FixedFetcher {
    async fn fetch(&self, request: &Request, _cache_mode: CacheMode) -> Result<Response, Error> {
        self.routes
            .get(request.url.path())
            .cloned()
            .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))
    }
}

pub(crate) async fn controller(fetcher: FixedFetcher) -> (CacheController, Arc<dyn Fetcher>) {
    let fetcher: Arc<dyn Fetcher> = Arc::new(fetcher);
    let retry = RetryPolicy::new(2, vec![Duration::from_millis(1)], Duration::from_millis(100));
    let config = WorkerConfig::new(url::Url::parse(ORIGIN).unwrap(), "cyft-v2", "cyft-")
        .with_retry(retry)
        .with_seed_assets(vec!["/".into()]);
    let db = CacheDb::open_in_memory().await.unwrap();
    (CacheController::new(config, db, fetcher.clone()), fetcher)
}

pub(crate) fn output_json(result: &CallToolResult) -> serde_json::Value {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .expect("Expected text content");
    serde_json::from_str(&text).unwrap()
}
