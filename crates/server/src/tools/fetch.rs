//! sw_fetch tool implementation.
//!
//! Delivers a fetch trigger event for one request and reports the worker's
//! decision: pass through, respond (from cache, network or offline fallback),
//! or no response.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::resolve;
use swcache_core::{FetchOutcome, Request, RequestMode, ResponseSource, ResponseType};

use super::{Worker, json_result};
use crate::error::ToolError;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// URL to request. Relative paths resolve against the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Whether this is a top-level document load.
    #[serde(default)]
    pub navigate: bool,

    /// Request mode for subresources: "no-cors" (default), "cors" or "same-origin".
    /// Ignored when `navigate` is set.
    #[serde(default)]
    pub mode: Option<RequestMode>,
}

fn default_method() -> String {
    "GET".into()
}

/// What the worker did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    Passthrough,
    Respond,
    NoResponse,
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    pub disposition: Disposition,
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    pub response_type: Option<ResponseType>,
    pub content_type: Option<String>,
    /// Response body as (lossy) UTF-8 text.
    pub body: Option<String>,
}

fn build_request(worker: &Worker, params: &SwFetchParams) -> Result<Request, ToolError> {
    let method = params.method.trim();
    if method.is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()));
    }

    let url =
        resolve(&worker.fetcher().config().origin, &params.url).map_err(|e| ToolError::InvalidUrl(e.to_string()))?;
    let mode = if params.navigate { RequestMode::Navigate } else { params.mode.unwrap_or_default() };

    Ok(Request::new(method, url).with_mode(mode))
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;
    let outcome = worker.handle_fetch(&request).await?;

    let mut output = SwFetchOutput {
        url: request.url.to_string(),
        disposition: Disposition::NoResponse,
        source: None,
        status: None,
        response_type: None,
        content_type: None,
        body: None,
    };

    match outcome {
        FetchOutcome::Passthrough => output.disposition = Disposition::Passthrough,
        FetchOutcome::NoResponse => {}
        FetchOutcome::Respond { mut response, source } => {
            output.disposition = Disposition::Respond;
            output.source = Some(source);
            output.status = Some(response.status);
            output.response_type = Some(response.response_type);
            output.content_type = response.header("content-type").map(str::to_string);
            output.body = Some(response.text()?);
        }
    }

    json_result(&output)
}
