//! Core types and shared functionality for the cyft offline cache controller.
//!
//! This crate provides:
//! - Cache Storage implementation with SQLite backend
//! - Request/response model
//! - Cache naming, classification and retry policy
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod policy;

pub use cache::{CacheDb, EntryInfo, NamedCache};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use http::{CacheMode, Request, RequestMode, Response};
pub use policy::{CacheKind, CacheNames, CachePolicy, CacheRules, RetryPolicy};
