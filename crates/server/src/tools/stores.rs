//! cache_stores tool implementation.
//!
//! Lists every cache store with its entry count.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;
use swcache_core::{StoreSummary, WorkerState};

use super::{Worker, json_result};

/// Output from the cache_stores tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheStoresOutput {
    /// Name of the store this version reads and writes.
    pub current: String,
    /// Worker lifecycle state.
    pub state: WorkerState,
    /// All stores, in creation order.
    pub stores: Vec<StoreSummary>,
}

/// Implementation of the cache_stores tool.
pub async fn stores_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let stores = worker.db().store_summaries().await?;
    let output =
        CacheStoresOutput { current: worker.config().cache_name.clone(), state: worker.state().await, stores };
    json_result(&output)
}
