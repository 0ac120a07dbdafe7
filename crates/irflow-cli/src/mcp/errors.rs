//! Mapping of tracker errors onto MCP error codes

use irflow_core::FlowError;
use rmcp::ErrorData;

/// Converts a tracker error into an MCP error.
///
/// Rule violations and lookups of unknown resources are the caller's fault
/// and map to `invalid_params`; everything else is an internal error.
pub fn to_mcp_error(message: &str, error: FlowError) -> ErrorData {
    let text = format!("{message}: {error}");
    match error {
        FlowError::FlowNotFound { .. }
        | FlowError::StepNotFound { .. }
        | FlowError::PlaybookNotFound { .. } => ErrorData::invalid_params(text, None),
        e if e.is_validation() => ErrorData::invalid_params(text, None),
        _ => ErrorData::internal_error(text, None),
    }
}
