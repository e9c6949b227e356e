//! sw_fetch tool implementation.
//!
//! Delivers a request to the controller the way a page would issue it. An
//! inactive worker or a request the controller declines goes straight to the
//! network, once, with no caching.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cyft_client::{CacheController, FetchOutcome, Fetcher};
use cyft_core::{CacheMode, Request, RequestMode, Response};

use super::{json_result, resolve_url};
use crate::error::ToolError;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the worker origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin" (default), "cors" or "no-cors".
    #[serde(default)]
    pub mode: RequestMode,

    /// Optional Accept header.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The request URL after resolution.
    pub url: String,
    pub status: u16,
    /// "network", "cache", "offline" or "passthrough".
    pub source: String,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    /// Body size in bytes.
    pub size: usize,
    /// Worker state when the request was handled.
    pub state: String,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(
    controller: &CacheController, network: &dyn Fetcher, params: SwFetchParams,
) -> Result<CallToolResult, McpError> {
    if params.method.trim().is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve_url(&controller.config().origin, &params.url)?;
    let mut request = Request::new(params.method.trim(), url).with_mode(params.mode);
    if let Some(accept) = params.accept {
        request = request.with_header("accept", accept);
    }

    let state = controller.state();
    let outcome =
        if state.can_intercept_fetch() { controller.on_fetch(&request).await? } else { FetchOutcome::Passthrough };

    let (response, source) = match outcome {
        FetchOutcome::Respond { response, source } => (response, source.as_str()),
        FetchOutcome::Passthrough => {
            tracing::debug!("passthrough {} {}", request.method, request.url);
            (network.fetch(&request, CacheMode::Default).await?, "passthrough")
        }
    };

    json_result(&output(&request, response, source, &state.to_string()))
}

fn output(request: &Request, response: Response, source: &str, state: &str) -> SwFetchOutput {
    SwFetchOutput {
        url: request.url.to_string(),
        status: response.status,
        source: source.to_string(),
        size: response.body.len(),
        body: String::from_utf8_lossy(&response.body).into_owned(),
        headers: response.headers,
        state: state.to_string(),
    }
}
