//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the cache storage.

pub mod get;

pub use get::{CacheGetParams, get_impl};
