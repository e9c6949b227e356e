//! Client code for cyft-sw.
//!
//! This crate provides the cache controller (lifecycle, fetch strategies,
//! control messages) and the resilient network boundary it sits on. Hosts
//! drive it; the server crate is one such host.

pub mod assets;
pub mod controller;
pub mod fetch;
pub mod messages;
pub mod offline;

#[cfg(test)]
mod testing;

pub use assets::{critical_assets, discover_assets};
pub use controller::{
    ActivateReport, CacheController, FetchOutcome, PrecacheReport, ResponseSource, WorkerConfig, WorkerState,
    spawn_detached,
};
pub use fetch::{FetchConfig, Fetcher, HttpFetcher, RetryingFetcher};
pub use messages::Command;
pub use offline::offline_response;
