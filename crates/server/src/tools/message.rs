//! sw_message tool implementation.
//!
//! Posts a control message to the worker. The page side never hears back,
//! so the output only acknowledges that the message was handled.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use cyft_client::{CacheController, Command};

use super::json_result;

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// "SKIP_WAITING", "CLEAR_CACHE" or "CACHE_URLS".
    #[serde(rename = "type")]
    pub kind: String,

    /// Message payload; `{ "urls": [...] }` for CACHE_URLS.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// Output structure for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageOutput {
    #[serde(rename = "type")]
    pub kind: String,
    /// Worker state after the message was handled.
    pub state: String,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(controller: &CacheController, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    let mut message = json!({ "type": params.kind });
    if let Some(payload) = params.payload {
        message["payload"] = payload;
    }

    let command = Command::from_json(message)?;
    let kind = command.kind().to_string();
    controller.on_message(command).await?;

    json_result(&SwMessageOutput { kind, state: controller.state().to_string() })
}
