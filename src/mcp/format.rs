//! Rendering of vault responses into the MCP content envelope

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::core::client::{Payload, VaultResponse};

/// Sentinel emitted when a response cannot be rendered. Callers see this
/// text instead of a transport-level failure.
const FORMAT_FAILURE: &str = "Error formatting response data";

/// Convert a vault response into exactly one text content block.
///
/// String payloads pass through byte-for-byte so markdown survives
/// unquoted; `null` renders as the empty string; a response with no `data`
/// field at all (bodiless success, or a failure wrapper) is rendered as the
/// whole wrapper object. Backend failures therefore reach the caller as
/// response content, never as a protocol error.
pub fn tool_response(response: &VaultResponse) -> CallToolResult {
    CallToolResult::success(vec![Content::text(render(response))])
}

fn render(response: &VaultResponse) -> String {
    match &response.data {
        Some(Payload::Text(text)) => text.clone(),
        Some(Payload::Json(Value::Null)) => String::new(),
        Some(Payload::Json(value)) => pretty(value),
        None => pretty(response),
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        error!(error = %err, "failed to render tool response");
        FORMAT_FAILURE.to_string()
    })
}
