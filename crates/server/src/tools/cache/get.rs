//! cache_get tool implementation.
//!
//! Lists every stored entry for a URL, across caches.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cyft_client::CacheController;
use cyft_core::{EntryInfo, Error};

use crate::tools::{json_result, resolve_url};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    pub entries: Vec<EntryInfo>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(controller: &CacheController, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = resolve_url(&controller.config().origin, &params.url)?.to_string();
    let entries = controller.db().find_entries(&url).await?;
    if entries.is_empty() {
        return Err(Error::CacheMiss(url).into());
    }

    json_result(&CacheGetOutput { url, entries })
}
