//! MCP tool implementations.
//!
//! This module contains all tools exposed by the cyft-sw server. Each tool
//! is a thin adapter over the cache controller; output is pretty JSON text.

pub mod cache;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod status;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub use fetch::SwFetchParams;
pub use message::SwMessageParams;

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::SerializeFailed(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Resolve a tool-supplied URL or path against the worker origin.
pub(crate) fn resolve_url(origin: &url::Url, input: &str) -> Result<url::Url, cyft_core::Error> {
    cyft_client::fetch::resolve(origin, input).map_err(|e| cyft_core::Error::InvalidUrl(e.to_string()))
}
