//! MCP notification names and payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sent by the client once the initialize handshake has completed.
pub const INITIALIZED_NOTIFICATION: &str = "notifications/initialized";

/// Server-to-client log line.
pub const LOG_MESSAGE_NOTIFICATION: &str = "notifications/message";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessageParams {
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}
