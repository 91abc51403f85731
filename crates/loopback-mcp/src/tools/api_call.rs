//! Tool: api_call — Make an HTTP API call to the specified URL.
//!
//! Bad arguments fail the call. Network failures do not: they come back as
//! an `API Call Failed` text result.

use serde_json::{json, Value};

use loopback_tools::{
    call_api, http_client, render_failure, render_response, ApiCallRequest, ApiResponse,
    ToolsResult,
};

use crate::types::{McpError, McpResult, ToolCallResult};

use super::Tool;

pub const NAME: &str = "api_call";

pub fn tool() -> Tool {
    Tool::new(
        NAME,
        "Make an HTTP API call to the specified URL",
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "format": "uri",
                    "description": "The URL to make the API call to"
                },
                "method": {
                    "type": "string",
                    "enum": ["GET", "POST", "PUT", "DELETE"],
                    "default": "GET",
                    "description": "HTTP method"
                },
                "headers": {
                    "type": "object",
                    "additionalProperties": { "type": "string" },
                    "description": "HTTP headers"
                },
                "body": {
                    "type": "string",
                    "description": "Request body for POST/PUT requests"
                }
            },
            "required": ["url"]
        }),
        execute,
    )
}

pub async fn execute(args: Value) -> McpResult<ToolCallResult> {
    let request =
        ApiCallRequest::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))?;

    let text = match perform(&request).await {
        Ok(response) => render_response(&response),
        Err(e) => {
            tracing::warn!("api_call to {} failed: {e}", request.url);
            render_failure(&e)
        }
    };

    Ok(ToolCallResult::text(text))
}

async fn perform(request: &ApiCallRequest) -> ToolsResult<ApiResponse> {
    let client = http_client()?;
    call_api(&client, request).await
}
