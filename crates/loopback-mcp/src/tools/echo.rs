//! Tool: echo — Echo back the provided message.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::{McpError, McpResult, ToolCallResult};

use super::Tool;

pub const NAME: &str = "echo";

#[derive(Debug, Deserialize)]
struct EchoParams {
    message: String,
}

pub fn tool() -> Tool {
    Tool::new(
        NAME,
        "Echo back the provided message",
        json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "The message to echo back" }
            },
            "required": ["message"]
        }),
        execute,
    )
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let params: EchoParams =
        serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    Ok(ToolCallResult::text(loopback_tools::echo(&params.message)))
}
