//! Error types and JSON-RPC error codes for the MCP engine.

use std::time::Duration;

use serde_json::{json, Value};

use super::message::{Envelope, JsonRpcErrorObject, RequestId};

/// Standard JSON-RPC 2.0 error codes.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// All errors that can occur on either endpoint.
#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method '{0}' not found")]
    MethodNotFound(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Tool execution failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },

    #[error("Internal error: {0}")]
    InternalError(String),

    /// An error response whose code has no more specific mapping.
    #[error("Remote error {code}: {message}")]
    Remote { code: i32, message: String },

    #[error("Channel cannot be connected: {0}")]
    NotConnectable(String),

    #[error("Channel not connected")]
    NotConnected,

    #[error("Session not initialized")]
    NotInitialized,

    #[error("Failed to initialize session: {0}")]
    InitializationFailed(String),

    #[error("Channel disconnected before request {0} was answered")]
    Disconnected(RequestId),

    #[error("Request {id} timed out after {after:?}")]
    Timeout { id: RequestId, after: Duration },

    #[error("Request id {0} is already in flight")]
    DuplicateRequestId(RequestId),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn code(&self) -> i32 {
        use error_codes::*;
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) | McpError::ToolNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::ToolExecutionFailed { .. } | McpError::InternalError(_) => INTERNAL_ERROR,
            McpError::Remote { code, .. } => *code,
            McpError::NotConnectable(_)
            | McpError::NotConnected
            | McpError::NotInitialized
            | McpError::InitializationFailed(_)
            | McpError::Disconnected(_)
            | McpError::Timeout { .. }
            | McpError::DuplicateRequestId(_)
            | McpError::Transport(_)
            | McpError::Json(_) => INTERNAL_ERROR,
        }
    }

    /// True for both flavours of "nothing answers to that name".
    pub fn is_not_found(&self) -> bool {
        matches!(self, McpError::MethodNotFound(_) | McpError::ToolNotFound(_))
    }

    /// Wire form of this error. Not-found and tool failures carry the
    /// names the client needs to rebuild the typed variant.
    pub fn to_error_object(&self) -> JsonRpcErrorObject {
        let data = match self {
            McpError::MethodNotFound(method) => Some(json!({ "method": method })),
            McpError::ToolNotFound(tool) => Some(json!({ "tool": tool })),
            McpError::ToolExecutionFailed { tool, reason } => {
                Some(json!({ "tool": tool, "reason": reason }))
            }
            _ => None,
        };

        JsonRpcErrorObject {
            code: self.code(),
            message: self.to_string(),
            data,
        }
    }

    pub fn to_json_rpc_error(&self, id: RequestId) -> Envelope {
        Envelope::failure(id, self.to_error_object())
    }

    /// Rebuild a typed failure from an error response.
    pub fn from_error_object(error: JsonRpcErrorObject) -> Self {
        use error_codes::*;

        let field = |name: &str| -> Option<String> {
            error
                .data
                .as_ref()
                .and_then(|d| d.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        match error.code {
            METHOD_NOT_FOUND => match (field("tool"), field("method")) {
                (Some(tool), _) => McpError::ToolNotFound(tool),
                (None, Some(method)) => McpError::MethodNotFound(method),
                (None, None) => McpError::Remote {
                    code: error.code,
                    message: error.message,
                },
            },
            INTERNAL_ERROR => match (field("tool"), field("reason")) {
                (Some(tool), Some(reason)) => McpError::ToolExecutionFailed { tool, reason },
                _ => McpError::Remote {
                    code: error.code,
                    message: error.message,
                },
            },
            code => McpError::Remote {
                code,
                message: error.message,
            },
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
