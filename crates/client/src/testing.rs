//! Scripted fetcher for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use url::Url;

use cyft_core::{CacheMode, Error, Request, Response};

use crate::fetch::Fetcher;

pub(crate) const ORIGIN: &str = "https://cyft.example";

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    Respond(Response),
    Status(u16),
    Fail,
    Hang,
}

impl Behavior {
    pub(crate) fn ok(body: &str) -> Self {
        Behavior::Respond(Response::new(200, body.to_string()))
    }
}

struct Call {
    path: String,
    cache_mode: CacheMode,
    at: Instant,
}

/// Answers by URL path. A scripted sequence is consumed in order and its
/// last step repeats; unrouted paths answer 404.
pub(crate) struct StubFetcher {
    origin: Url,
    routes: Mutex<HashMap<String, VecDeque<Behavior>>>,
    calls: Mutex<Vec<Call>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self {
            origin: Url::parse(ORIGIN).unwrap(),
            routes: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn route(&self, path: &str, behavior: Behavior) {
        self.route_sequence(path, vec![behavior]);
    }

    pub(crate) fn route_sequence(&self, path: &str, behaviors: Vec<Behavior>) {
        self.routes.lock().unwrap().insert(path.to_string(), behaviors.into());
    }

    pub(crate) fn request(&self, path: &str) -> Request {
        Request::get(self.origin.join(path).unwrap())
    }

    pub(crate) fn call_count(&self, path: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.path == path).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn call_times(&self, path: &str) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().filter(|c| c.path == path).map(|c| c.at).collect()
    }

    pub(crate) fn cache_modes(&self, path: &str) -> Vec<CacheMode> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.path == path)
            .map(|c| c.cache_mode)
            .collect()
    }

    /// Poll until `path` has been fetched at least `count` times.
    pub(crate) async fn wait_for_calls(&self, path: &str, count: usize) -> bool {
        for _ in 0..500 {
            if self.call_count(path) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        false
    }

    fn next_behavior(&self, path: &str) -> Behavior {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Behavior::Status(404)),
            None => Behavior::Status(404),
        }
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request, cache_mode: CacheMode) -> Result<Response, Error> {
        let path = request.url.path().to_string();
        self.calls.lock().unwrap().push(Call { path: path.clone(), cache_mode, at: Instant::now() });

        match self.next_behavior(&path) {
            Behavior::Respond(response) => Ok(response),
            Behavior::Status(status) => Ok(Response::new(status, "")),
            Behavior::Fail => Err(Error::Network(format!("connection refused: {}", request.url))),
            Behavior::Hang => std::future::pending().await,
        }
    }
}
