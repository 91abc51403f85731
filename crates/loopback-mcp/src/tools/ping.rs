//! Tool: ping — Send a ping and receive a pong response.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult};

use super::Tool;

pub const NAME: &str = "ping";

#[derive(Debug, Deserialize)]
struct PingParams {
    #[serde(default)]
    target: Option<String>,
}

pub fn tool() -> Tool {
    Tool::new(
        NAME,
        "Send a ping and receive a pong response",
        json!({
            "type": "object",
            "properties": {
                "target": { "type": "string", "description": "Optional target to ping" }
            },
            "required": []
        }),
        execute,
    )
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: PingParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let text = loopback_tools::pong(params.target.as_deref(), chrono::Utc::now());
    Ok(ToolCallResult::text(text))
}
