//! SQLite-backed Cache Storage.
//!
//! This module provides persistent named caches of request/response pairs
//! using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Named caches, enumerable in creation order
//! - URL-keyed entries using SHA-256 hashing
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Cascading deletes when a cache is dropped

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod storage;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::{EntryInfo, NamedCache};
