//! Structured errors for the swcache host tools.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Errors raised while translating tool parameters into worker requests.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., empty method).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The URL could not be resolved against the app origin.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(msg) => (-32602, msg.clone()),
            ToolError::InvalidUrl(msg) => (-32004, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
