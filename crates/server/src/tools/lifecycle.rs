//! sw_install and sw_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cyft_client::CacheController;

use super::json_result;

/// Output structure for sw_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwInstallOutput {
    pub state: String,
    /// Assets fetched and stored in the static cache.
    pub stored: Vec<String>,
    /// Assets that could not be fetched or answered non-OK.
    pub failed: Vec<String>,
}

/// Output structure for sw_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwActivateOutput {
    pub state: String,
    pub controlling: bool,
    /// Caches from other versions that were deleted.
    pub deleted: Vec<String>,
}

pub async fn install_impl(controller: &CacheController) -> Result<CallToolResult, McpError> {
    let report = controller.on_install().await?;
    json_result(&SwInstallOutput {
        state: controller.state().to_string(),
        stored: report.stored,
        failed: report.failed,
    })
}

pub async fn activate_impl(controller: &CacheController) -> Result<CallToolResult, McpError> {
    let report = controller.on_activate().await?;
    json_result(&SwActivateOutput {
        state: controller.state().to_string(),
        controlling: controller.is_controlling(),
        deleted: report.deleted,
    })
}
