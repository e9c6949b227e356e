//! Control messages sent from pages to the controller.
//!
//! Wire shape is `{ "type": "...", "payload": { ... } }`. Messages are
//! fire-and-forget: nothing is sent back to the page.

use serde::{Deserialize, Serialize};

use cyft_core::Error;

/// A control command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Activate a waiting worker immediately.
    SkipWaiting,
    /// Delete every cache.
    ClearCache,
    /// Pre-cache the listed URLs into the static cache.
    CacheUrls { urls: Vec<String> },
}

impl Command {
    pub fn from_json(value: serde_json::Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::InvalidMessage(e.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::SkipWaiting => "SKIP_WAITING",
            Command::ClearCache => "CLEAR_CACHE",
            Command::CacheUrls { .. } => "CACHE_URLS",
        }
    }
}
