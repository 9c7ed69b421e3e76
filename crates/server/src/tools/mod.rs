//! MCP tool implementations.
//!
//! Each tool delivers one trigger event to the cache worker (or inspects the
//! cache storage) and returns its outcome as pretty-printed JSON.
#![allow(unused_imports)]

pub mod fetch;
pub mod lifecycle;
pub mod stores;

pub use fetch::{SwFetchOutput, SwFetchParams};
pub use lifecycle::{SwActivateOutput, SwInstallOutput};
pub use stores::CacheStoresOutput;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use swcache_client::FetchClient;
use swcache_core::{CacheWorker, LocalHost};

use crate::error::ToolError;

/// The worker as wired up by this host.
pub type Worker = CacheWorker<FetchClient, LocalHost>;

fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
