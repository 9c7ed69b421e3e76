//! sw_install and sw_activate tool implementations.
//!
//! Deliver the install and activate trigger events and report what the
//! worker did, including which control signals it sent to the host.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;
use swcache_core::WorkerState;
use swcache_core::worker::{ActivateReport, InstallReport};

use super::{Worker, json_result};

/// Output from the sw_install tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwInstallOutput {
    #[serde(flatten)]
    pub report: InstallReport,
    /// Worker state after install.
    pub state: WorkerState,
    /// Whether the worker asked to take over without waiting.
    pub skip_waiting: bool,
}

/// Output from the sw_activate tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwActivateOutput {
    #[serde(flatten)]
    pub report: ActivateReport,
    /// Worker state after activation.
    pub state: WorkerState,
    /// Whether the worker claimed the open clients.
    pub clients_claimed: bool,
}

/// Implementation of the sw_install tool.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.install().await?;
    let output = SwInstallOutput {
        report,
        state: worker.state().await,
        skip_waiting: worker.host().skip_waiting_requested(),
    };
    json_result(&output)
}

/// Implementation of the sw_activate tool.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let report = worker.activate().await?;
    let output = SwActivateOutput {
        report,
        state: worker.state().await,
        clients_claimed: worker.host().clients_claimed(),
    };
    json_result(&output)
}
