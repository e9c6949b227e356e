//! sw_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cyft_client::CacheController;

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheSummary {
    pub name: String,
    pub entries: usize,
}

/// Output structure for sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    pub version: String,
    pub origin: String,
    pub state: String,
    /// Whether the worker has claimed its clients.
    pub controlling: bool,
    pub skip_waiting: bool,
    /// Every cache in storage, product or not, in creation order.
    pub caches: Vec<CacheSummary>,
}

pub async fn status_impl(controller: &CacheController) -> Result<CallToolResult, McpError> {
    let db = controller.db();
    let mut caches = Vec::new();
    for name in db.cache_names().await? {
        let entries = db.open_cache(&name).await?.len().await?;
        caches.push(CacheSummary { name, entries });
    }

    let config = controller.config();
    json_result(&SwStatusOutput {
        version: config.names.version().to_string(),
        origin: config.origin.to_string(),
        state: controller.state().to_string(),
        controlling: controller.is_controlling(),
        skip_waiting: controller.skip_waiting_requested(),
        caches,
    })
}
