//! The cache controller: lifecycle, request interception and control
//! messages for one worker version.
//!
//! ### Lifecycle
//! - [`CacheController::on_install`] warms the static cache with the
//!   critical assets and requests skip-waiting.
//! - [`CacheController::on_activate`] evicts caches left by other versions
//!   and claims all clients.
//! - [`CacheController::boot`] runs both, the way a host does on first
//!   registration.
//!
//! ### Requests
//! - [`CacheController::on_fetch`] routes same-origin GETs to a strategy
//!   (see [`strategy`]); everything else passes through.
//! - Hosts must only deliver requests once [`WorkerState::can_intercept_fetch`]
//!   holds.
//!
//! ### Messages
//! - [`CacheController::on_message`] handles [`Command`]s. Nothing is sent
//!   back; failures only surface as errors to the host.

pub mod background;
pub mod lifecycle;
pub mod strategy;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::{join_all, try_join_all};
use tokio::sync::{Mutex, watch};
use url::Url;

use cyft_core::{AppConfig, CacheDb, CacheKind, CacheNames, CacheRules, Error, NamedCache, Request, RetryPolicy};

use crate::assets::critical_assets;
use crate::fetch::{Fetcher, RetryingFetcher, resolve};
use crate::messages::Command;

pub use background::spawn_detached;
pub use lifecycle::{ActivateReport, PrecacheReport, WorkerState};
pub use strategy::{FetchOutcome, ResponseSource};

/// Everything a controller needs to know about its version.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Scope of the worker; only same-origin requests are intercepted.
    pub origin: Url,
    pub names: CacheNames,
    /// Caches with this prefix belong to the product and are evicted on
    /// activation unless they match `names`.
    pub cache_prefix: String,
    pub rules: CacheRules,
    pub retry: RetryPolicy,
    pub seed_assets: Vec<String>,
}

impl WorkerConfig {
    pub fn new(origin: Url, version: &str, cache_prefix: &str) -> Self {
        Self {
            origin,
            names: CacheNames::new(version),
            cache_prefix: cache_prefix.to_string(),
            rules: CacheRules::default(),
            retry: RetryPolicy::default(),
            seed_assets: vec!["/".into(), "/index.html".into(), "/favicon.svg".into()],
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_seed_assets(mut self, seed_assets: Vec<String>) -> Self {
        self.seed_assets = seed_assets;
        self
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin =
            Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin {}: {e}", config.origin)))?;
        Ok(Self::new(origin, &config.version, &config.cache_prefix)
            .with_retry(config.retry_policy())
            .with_seed_assets(config.seed_assets.clone()))
    }
}

struct Shared {
    config: WorkerConfig,
    db: CacheDb,
    fetcher: RetryingFetcher,
    state: watch::Sender<WorkerState>,
    /// Serializes install and activate.
    lifecycle: Mutex<()>,
    skip_waiting: AtomicBool,
    controlling: AtomicBool,
}

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CacheController {
    shared: Arc<Shared>,
}

impl CacheController {
    pub fn new(config: WorkerConfig, db: CacheDb, fetcher: Arc<dyn Fetcher>) -> Self {
        let fetcher = RetryingFetcher::new(fetcher, config.retry.clone());
        let (state, _) = watch::channel(WorkerState::Parsed);
        Self {
            shared: Arc::new(Shared {
                config,
                db,
                fetcher,
                state,
                lifecycle: Mutex::new(()),
                skip_waiting: AtomicBool::new(false),
                controlling: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.shared.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.shared.db
    }

    pub fn state(&self) -> WorkerState {
        *self.shared.state.borrow()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.shared.state.subscribe()
    }

    /// Whether this worker has claimed its clients.
    pub fn is_controlling(&self) -> bool {
        self.shared.controlling.load(Ordering::SeqCst)
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.shared.skip_waiting.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: WorkerState) {
        let previous = self.shared.state.send_replace(state);
        tracing::debug!("worker {} -> {}", previous, state);
    }

    /// Install, then activate if skip-waiting was requested.
    pub async fn boot(&self) -> Result<(), Error> {
        self.on_install().await?;
        if self.skip_waiting_requested() {
            self.on_activate().await?;
        }
        Ok(())
    }

    /// Pre-cache the critical assets into the static cache.
    ///
    /// Individual asset failures are logged and reported, never fatal.
    /// Failing to open the static cache leaves the worker `Redundant`.
    pub async fn on_install(&self) -> Result<PrecacheReport, Error> {
        let _guard = self.shared.lifecycle.lock().await;

        let state = self.state();
        if !state.can_install() {
            return Err(Error::InvalidState(format!("cannot install from {state}")));
        }
        self.set_state(WorkerState::Installing);

        let result = async {
            let cache = self.shared.db.open_cache(&self.shared.config.names.name(CacheKind::Static)).await?;
            let assets = self.detect_critical_assets().await;
            Ok::<_, Error>(self.precache(&cache, &assets).await)
        }
        .await;

        match result {
            Ok(report) => {
                tracing::info!(
                    version = self.shared.config.names.version(),
                    stored = report.stored.len(),
                    failed = report.failed.len(),
                    "installed"
                );
                self.set_state(WorkerState::Installed);
                self.shared.skip_waiting.store(true, Ordering::SeqCst);
                Ok(report)
            }
            Err(err) => {
                tracing::error!("install failed: {}", err);
                self.set_state(WorkerState::Redundant);
                Err(err)
            }
        }
    }

    /// Evict caches from other versions, ensure this version's caches exist,
    /// and claim clients.
    ///
    /// Caches without the product prefix are left alone.
    pub async fn on_activate(&self) -> Result<ActivateReport, Error> {
        let _guard = self.shared.lifecycle.lock().await;

        let previous = self.state();
        if !previous.can_activate() {
            return Err(Error::InvalidState(format!("cannot activate from {previous}")));
        }
        self.set_state(WorkerState::Activating);

        match self.evict_stale_caches().await {
            Ok(deleted) => {
                self.shared.controlling.store(true, Ordering::SeqCst);
                self.set_state(WorkerState::Activated);
                tracing::info!(
                    version = self.shared.config.names.version(),
                    deleted = deleted.len(),
                    "activated"
                );
                Ok(ActivateReport { deleted })
            }
            Err(err) => {
                tracing::error!("activation failed: {}", err);
                self.set_state(previous);
                Err(err)
            }
        }
    }

    async fn evict_stale_caches(&self) -> Result<Vec<String>, Error> {
        let config = &self.shared.config;
        let stale: Vec<String> = self
            .shared
            .db
            .cache_names()
            .await?
            .into_iter()
            .filter(|name| config.names.is_stale(name, &config.cache_prefix))
            .collect();

        let results = try_join_all(stale.iter().map(|name| self.shared.db.delete_cache(name))).await?;
        for name in &stale {
            tracing::info!("deleting old cache {}", name);
        }

        for name in config.names.all() {
            self.shared.db.open_cache(&name).await?;
        }

        Ok(stale.into_iter().zip(results).filter_map(|(name, deleted)| deleted.then_some(name)).collect())
    }

    /// Handle an intercepted request.
    pub async fn on_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if !request.is_get() || !crate::fetch::is_same_origin(&request.url, &self.shared.config.origin) {
            return Ok(FetchOutcome::Passthrough);
        }

        let (response, source) = self.respond(request).await?;
        Ok(FetchOutcome::Respond { response, source })
    }

    /// Handle a control message.
    pub async fn on_message(&self, command: Command) -> Result<(), Error> {
        tracing::debug!("message {}", command.kind());
        match command {
            Command::SkipWaiting => self.skip_waiting().await,
            Command::ClearCache => self.clear_all_caches().await.map(|_| ()),
            Command::CacheUrls { urls } => self.cache_urls(&urls).await.map(|_| ()),
        }
    }

    /// Request skip-waiting. An installed worker activates immediately.
    pub async fn skip_waiting(&self) -> Result<(), Error> {
        self.shared.skip_waiting.store(true, Ordering::SeqCst);
        if self.state() == WorkerState::Installed {
            self.on_activate().await?;
        }
        Ok(())
    }

    /// Delete every cache, product or not. Returns how many were deleted.
    pub async fn clear_all_caches(&self) -> Result<usize, Error> {
        let names = self.shared.db.cache_names().await?;
        let deleted = try_join_all(names.iter().map(|name| self.shared.db.delete_cache(name))).await?;
        let count = deleted.into_iter().filter(|d| *d).count();
        tracing::info!("cleared {} caches", count);
        Ok(count)
    }

    /// Pre-cache `urls` into the static cache with retries.
    pub async fn cache_urls(&self, urls: &[String]) -> Result<PrecacheReport, Error> {
        let cache = self.shared.db.open_cache(&self.shared.config.names.name(CacheKind::Static)).await?;
        Ok(self.precache(&cache, urls).await)
    }

    /// Seed list plus whatever the root document references.
    ///
    /// The root is fetched once without retries and scanned whatever its
    /// status; if the fetch errors the seed list is used alone.
    async fn detect_critical_assets(&self) -> Vec<String> {
        let config = &self.shared.config;
        let html = match config.origin.join("/") {
            Ok(root) => {
                let request = Request::get(root).with_header("accept", "text/html");
                match self.shared.fetcher.fetch_once(&request).await {
                    Ok(response) => {
                        if !response.is_ok() {
                            tracing::warn!("root document answered {}", response.status);
                        }
                        Some(response.text())
                    }
                    Err(err) => {
                        tracing::error!("failed to detect critical assets: {}", err);
                        None
                    }
                }
            }
            Err(err) => {
                tracing::error!("failed to detect critical assets: {}", err);
                None
            }
        };

        critical_assets(&config.seed_assets, html.as_deref())
    }

    /// Settle-all: every URL is attempted regardless of the others.
    async fn precache(&self, cache: &NamedCache, urls: &[String]) -> PrecacheReport {
        let results = join_all(urls.iter().map(|url| self.cache_with_retry(cache, url))).await;

        let mut report = PrecacheReport::default();
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(true) => report.stored.push(url.clone()),
                Ok(false) => report.failed.push(url.clone()),
                Err(err) => {
                    tracing::warn!("failed to cache {}: {}", url, err);
                    report.failed.push(url.clone());
                }
            }
        }
        report
    }

    /// Fetch `url` with retries and store it if OK. Returns whether it was
    /// stored.
    async fn cache_with_retry(&self, cache: &NamedCache, url: &str) -> Result<bool, Error> {
        let url = resolve(&self.shared.config.origin, url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let request = Request::get(url);
        let response = self.shared.fetcher.fetch(&request).await?;

        if !response.is_ok() {
            tracing::warn!("failed to cache {}: status {}", request.url, response.status);
            return Ok(false);
        }
        cache.put(&request, &response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, ORIGIN, StubFetcher};
    use cyft_core::{RequestMode, Response};
    use serde_json::json;
    use std::time::Duration;

    const INDEX: &str = r#"<html><head><link rel="stylesheet" href="/assets/style.css"></head>
<body><script src="/assets/app.js"></script></body></html>"#;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(
            3,
            vec![Duration::from_millis(1), Duration::from_millis(2), Duration::from_millis(4)],
            Duration::from_millis(100),
        )
    }

    fn config(version: &str) -> WorkerConfig {
        WorkerConfig::new(Url::parse(ORIGIN).unwrap(), version, "cyft-").with_retry(fast_retry())
    }

    async fn controller(stub: &Arc<StubFetcher>, version: &str) -> CacheController {
        let db = CacheDb::open_in_memory().await.unwrap();
        CacheController::new(config(version), db, stub.clone())
    }

    async fn activated(stub: &Arc<StubFetcher>) -> CacheController {
        let controller = controller(stub, "cyft-v2").await;
        controller.boot().await.unwrap();
        assert_eq!(controller.state(), WorkerState::Activated);
        controller
    }

    fn respond(outcome: FetchOutcome) -> (Response, ResponseSource) {
        match outcome {
            FetchOutcome::Respond { response, source } => (response, source),
            FetchOutcome::Passthrough => panic!("expected a response"),
        }
    }

    #[test]
    fn test_worker_config_from_app_config() {
        let app = AppConfig::default();
        let config = WorkerConfig::from_app_config(&app).unwrap();
        assert_eq!(config.origin.as_str(), "http://localhost:8080/");
        assert_eq!(config.names.version(), "cyft-v3-chrome-fix");
        assert_eq!(config.seed_assets, app.seed_assets);
        assert_eq!(config.retry.attempts(), 3);
    }

    #[test]
    fn test_worker_config_rejects_bad_origin() {
        let app = AppConfig { origin: "not a url".into(), ..AppConfig::default() };
        assert!(matches!(WorkerConfig::from_app_config(&app), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_install_precaches_seed_and_discovered_assets() {
        let stub = Arc::new(StubFetcher::new());
        stub.route("/", Behavior::ok(INDEX));
        stub.route("/index.html", Behavior::ok(INDEX));
        stub.route("/favicon.svg", Behavior::Fail);
        stub.route("/assets/style.css", Behavior::ok("body{}"));
        stub.route("/assets/app.js", Behavior::ok("run()"));
        let controller = controller(&stub, "cyft-v2").await;

        let report = controller.on_install().await.unwrap();

        assert_eq!(report.stored, vec!["/", "/index.html", "/assets/style.css", "/assets/app.js"]);
        assert_eq!(report.failed, vec!["/favicon.svg"]);
        assert_eq!(controller.state(), WorkerState::Installed);
        assert!(controller.skip_waiting_requested());
        assert!(!controller.is_controlling());
        // discovery plus the pre-cache itself
        assert_eq!(stub.call_count("/"), 2);
        assert_eq!(stub.call_count("/favicon.svg"), 3);

        let cache = controller.db().open_cache("cyft-v2-static").await.unwrap();
        assert_eq!(cache.len().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_install_falls_back_to_seed_when_root_unreachable() {
        let stub = Arc::new(StubFetcher::new());
        stub.route("/", Behavior::Fail);
        stub.route("/index.html", Behavior::ok("index"));
        stub.route("/favicon.svg", Behavior::ok("<svg/>"));
        let controller = controller(&stub, "cyft-v2").await;

        let report = controller.on_install().await.unwrap();

        assert_eq!(report.stored, vec!["/index.html", "/favicon.svg"]);
        assert_eq!(report.failed, vec!["/"]);
        assert_eq!(controller.state(), WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_install_never_stores_non_ok() {
        let stub = Arc::new(StubFetcher::new());
        let controller = controller(&stub, "cyft-v2").await;

        let report = controller.on_install().await.unwrap();

        assert!(report.stored.is_empty());
        assert_eq!(report.failed.len(), 3);
        let cache = controller.db().open_cache("cyft-v2-static").await.unwrap();
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let stub = Arc::new(StubFetcher::new());
        let controller = controller(&stub, "cyft-v2").await;
        assert!(matches!(controller.on_activate().await, Err(Error::InvalidState(_))));
        assert_eq!(controller.state(), WorkerState::Parsed);
    }

    #[tokio::test]
    async fn test_install_rejected_once_active() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        assert!(matches!(controller.on_install().await, Err(Error::InvalidState(_))));
        assert_eq!(controller.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_evicts_other_versions_only() {
        let stub = Arc::new(StubFetcher::new());
        let db = CacheDb::open_in_memory().await.unwrap();
        for name in ["cyft-v1-static", "cyft-v1-dynamic", "cyft-v1-media", "other-app-cache"] {
            db.open_cache(name).await.unwrap();
        }
        let controller = CacheController::new(config("cyft-v2"), db.clone(), stub.clone());
        let mut states = controller.subscribe();

        controller.on_install().await.unwrap();
        let report = controller.on_activate().await.unwrap();

        assert_eq!(report.deleted, vec!["cyft-v1-static", "cyft-v1-dynamic", "cyft-v1-media"]);
        let mut names = db.cache_names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["cyft-v2-dynamic", "cyft-v2-media", "cyft-v2-static", "other-app-cache"]);
        assert!(controller.is_controlling());
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_twice_is_harmless() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        let report = controller.on_activate().await.unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(controller.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_passthrough_non_get_and_cross_origin() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        let before = stub.total_calls();

        let post = Request::new("POST", Url::parse("https://cyft.example/api/form").unwrap());
        assert!(matches!(controller.on_fetch(&post).await.unwrap(), FetchOutcome::Passthrough));

        let foreign = Request::parse("https://cdn.other.example/lib.js").unwrap();
        assert!(matches!(controller.on_fetch(&foreign).await.unwrap(), FetchOutcome::Passthrough));

        assert_eq!(stub.total_calls(), before);
    }

    #[tokio::test]
    async fn test_static_cache_hit_returns_immediately_and_refreshes() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        let request = stub.request("/app.js");
        let cache = controller.db().open_cache("cyft-v2-static").await.unwrap();
        cache.put(&request, &Response::new(200, "old")).await.unwrap();
        stub.route("/app.js", Behavior::ok("new"));

        let (response, source) = respond(controller.on_fetch(&request).await.unwrap());

        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(response.text(), "old");
        assert!(stub.wait_for_calls("/app.js", 1).await);

        let mut refreshed = false;
        for _ in 0..200 {
            if cache.match_request(&request).await.unwrap().is_some_and(|r| r.text() == "new") {
                refreshed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(refreshed);
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_wait_for_network() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        let request = stub.request("/hero.png");
        let cache = controller.db().open_cache("cyft-v2-media").await.unwrap();
        cache.put(&request, &Response::new(200, vec![1u8, 2, 3])).await.unwrap();
        stub.route("/hero.png", Behavior::Hang);

        let outcome = tokio::time::timeout(Duration::from_millis(50), controller.on_fetch(&request)).await;

        let (response, source) = respond(outcome.expect("cache hit answered promptly").unwrap());
        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(response.body.as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_static_miss_fetches_and_stores() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        stub.route("/theme.css", Behavior::ok("body{}"));

        let (response, source) = respond(controller.on_fetch(&stub.request("/theme.css")).await.unwrap());

        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.text(), "body{}");
        let cache = controller.db().open_cache("cyft-v2-static").await.unwrap();
        assert!(cache.match_request(&stub.request("/theme.css")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_static_miss_non_ok_returned_not_stored() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;

        let (response, source) = respond(controller.on_fetch(&stub.request("/gone.js")).await.unwrap());

        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.status, 404);
        assert!(controller.db().match_any(&stub.request("/gone.js")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_static_miss_offline_gets_fallback() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        stub.route("/bundle.js", Behavior::Fail);

        let (response, source) = respond(controller.on_fetch(&stub.request("/bundle.js")).await.unwrap());

        assert_eq!(source, ResponseSource::Offline);
        assert_eq!(response.content_type(), Some("application/javascript; charset=utf-8"));
        assert!(controller.db().match_any(&stub.request("/bundle.js")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dynamic_network_first_stores_ok() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        stub.route("/api/data", Behavior::ok(r#"{"n":1}"#));

        let (response, source) = respond(controller.on_fetch(&stub.request("/api/data")).await.unwrap());

        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.text(), r#"{"n":1}"#);
        let cache = controller.db().open_cache("cyft-v2-dynamic").await.unwrap();
        assert_eq!(cache.keys().await.unwrap(), vec!["https://cyft.example/api/data"]);
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_any_cache() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        let request = stub.request("/pricing");
        let cache = controller.db().open_cache("cyft-v2-static").await.unwrap();
        cache.put(&request, &Response::new(200, "cached pricing")).await.unwrap();
        stub.route("/pricing", Behavior::Fail);

        let (response, source) = respond(controller.on_fetch(&request).await.unwrap());

        assert_eq!(source, ResponseSource::Cache);
        assert_eq!(response.text(), "cached pricing");
        assert_eq!(stub.call_count("/pricing"), 3);
    }

    #[tokio::test]
    async fn test_offline_navigation_gets_offline_page() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        stub.route("/pricing", Behavior::Fail);
        let request = stub.request("/pricing").with_mode(RequestMode::Navigate).with_header("accept", "text/html");

        let (response, source) = respond(controller.on_fetch(&request).await.unwrap());

        assert_eq!(source, ResponseSource::Offline);
        assert_eq!(response.status, 200);
        assert!(response.text().contains("You're Offline"));
    }

    #[tokio::test]
    async fn test_navigation_overrides_extension() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        stub.route("/docs.svg", Behavior::ok("<svg/>"));
        let request = stub.request("/docs.svg").with_mode(RequestMode::Navigate);

        let (_, source) = respond(controller.on_fetch(&request).await.unwrap());

        assert_eq!(source, ResponseSource::Network);
        let dynamic = controller.db().open_cache("cyft-v2-dynamic").await.unwrap();
        let media = controller.db().open_cache("cyft-v2-media").await.unwrap();
        assert!(dynamic.match_request(&request).await.unwrap().is_some());
        assert!(media.match_request(&request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_skip_waiting_message_activates_installed_worker() {
        let stub = Arc::new(StubFetcher::new());
        let controller = controller(&stub, "cyft-v2").await;
        controller.on_install().await.unwrap();
        assert_eq!(controller.state(), WorkerState::Installed);

        let command = Command::from_json(json!({ "type": "SKIP_WAITING" })).unwrap();
        controller.on_message(command).await.unwrap();

        assert_eq!(controller.state(), WorkerState::Activated);
        assert!(controller.is_controlling());
    }

    #[tokio::test]
    async fn test_skip_waiting_before_install_only_sets_flag() {
        let stub = Arc::new(StubFetcher::new());
        let controller = controller(&stub, "cyft-v2").await;

        controller.on_message(Command::SkipWaiting).await.unwrap();

        assert!(controller.skip_waiting_requested());
        assert_eq!(controller.state(), WorkerState::Parsed);
    }

    #[tokio::test]
    async fn test_clear_cache_is_idempotent() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        controller.db().open_cache("other-app-cache").await.unwrap();

        controller.on_message(Command::ClearCache).await.unwrap();
        assert!(controller.db().cache_names().await.unwrap().is_empty());

        controller.on_message(Command::ClearCache).await.unwrap();
        assert!(controller.db().cache_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_urls_tolerates_failures() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        stub.route("/a.js", Behavior::ok("a"));
        stub.route("/b.css", Behavior::ok("b"));
        stub.route("/c.js", Behavior::Fail);

        let command = Command::from_json(json!({
            "type": "CACHE_URLS",
            "payload": { "urls": ["/a.js", "/b.css", "/c.js"] }
        }))
        .unwrap();
        controller.on_message(command).await.unwrap();

        let cache = controller.db().open_cache("cyft-v2-static").await.unwrap();
        let keys = cache.keys().await.unwrap();
        assert!(keys.contains(&"https://cyft.example/a.js".to_string()));
        assert!(keys.contains(&"https://cyft.example/b.css".to_string()));
        assert!(!keys.contains(&"https://cyft.example/c.js".to_string()));
        assert_eq!(stub.call_count("/c.js"), 3);
    }

    #[tokio::test]
    async fn test_cache_urls_reports_invalid_urls() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;

        let report = controller.cache_urls(&["ftp://cyft.example/file".to_string()]).await.unwrap();

        assert!(report.stored.is_empty());
        assert_eq!(report.failed, vec!["ftp://cyft.example/file"]);
    }

    #[tokio::test]
    async fn test_install_scans_non_ok_root_document() {
        let stub = Arc::new(StubFetcher::new());
        stub.route("/", Behavior::Respond(Response::new(404, INDEX)));
        stub.route("/assets/style.css", Behavior::ok("body{}"));
        stub.route("/assets/app.js", Behavior::ok("run()"));
        let controller = controller(&stub, "cyft-v2").await;

        let report = controller.on_install().await.unwrap();

        assert_eq!(report.stored, vec!["/assets/style.css", "/assets/app.js"]);
        assert_eq!(report.failed, vec!["/", "/index.html", "/favicon.svg"]);
    }

    #[tokio::test]
    async fn test_install_storage_failure_leaves_redundant() {
        let stub = Arc::new(StubFetcher::new());
        let controller = controller(&stub, "cyft-v2").await;
        controller.db().clone().close().await.unwrap();

        let result = controller.on_install().await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(controller.state(), WorkerState::Redundant);
        assert!(!controller.skip_waiting_requested());
        assert!(matches!(controller.on_install().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_failed_activation_restores_installed() {
        let stub = Arc::new(StubFetcher::new());
        let controller = controller(&stub, "cyft-v2").await;
        controller.on_install().await.unwrap();
        controller.db().clone().close().await.unwrap();

        let result = controller.on_activate().await;

        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(controller.state(), WorkerState::Installed);
        assert!(!controller.is_controlling());
    }

    #[tokio::test]
    async fn test_network_first_final_non_ok_wins_over_cache() {
        let stub = Arc::new(StubFetcher::new());
        let controller = activated(&stub).await;
        let request = stub.request("/api/x");
        let cache = controller.db().open_cache("cyft-v2-dynamic").await.unwrap();
        cache.put(&request, &Response::new(200, "stale")).await.unwrap();
        stub.route("/api/x", Behavior::Status(503));

        let (response, source) = respond(controller.on_fetch(&request).await.unwrap());

        assert_eq!(source, ResponseSource::Network);
        assert_eq!(response.status, 503);
        assert_eq!(stub.call_count("/api/x"), 3);
        let cached = cache.match_request(&request).await.unwrap().unwrap();
        assert_eq!(cached.text(), "stale");
    }
}
