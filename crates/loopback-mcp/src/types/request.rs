//! MCP request parameter types and the typed view of an incoming call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::capabilities::InitializeParams;
use super::error::{McpError, McpResult};

/// Reserved method names.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: Value,
}

fn empty_arguments() -> Value {
    Value::Object(serde_json::Map::new())
}

impl ToolCallParams {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// A request method with its parameters decoded into the shape that
/// method expects. Unknown methods keep their raw parameters.
#[derive(Debug, Clone)]
pub enum MethodCall {
    /// Initialize params are informational; unreadable ones come through as `None`.
    Initialize(Option<InitializeParams>),
    ToolsList,
    ToolsCall(ToolCallParams),
    Other {
        method: String,
        params: Option<Value>,
    },
}

impl MethodCall {
    pub fn parse(method: &str, params: Option<Value>) -> McpResult<Self> {
        match method {
            methods::INITIALIZE => {
                let init = match params.map(serde_json::from_value::<InitializeParams>) {
                    Some(Ok(init)) => Some(init),
                    Some(Err(e)) => {
                        tracing::warn!("Unreadable initialize params: {e}");
                        None
                    }
                    None => None,
                };
                Ok(MethodCall::Initialize(init))
            }
            methods::TOOLS_LIST => Ok(MethodCall::ToolsList),
            methods::TOOLS_CALL => {
                let call: ToolCallParams = params
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| McpError::InvalidParams(e.to_string()))?
                    .ok_or_else(|| {
                        McpError::InvalidParams("Tool call params required".to_string())
                    })?;
                Ok(MethodCall::ToolsCall(call))
            }
            other => Ok(MethodCall::Other {
                method: other.to_string(),
                params,
            }),
        }
    }

    pub fn method(&self) -> &str {
        match self {
            MethodCall::Initialize(_) => methods::INITIALIZE,
            MethodCall::ToolsList => methods::TOOLS_LIST,
            MethodCall::ToolsCall(_) => methods::TOOLS_CALL,
            MethodCall::Other { method, .. } => method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tools_call_defaults_arguments() {
        let call = MethodCall::parse("tools/call", Some(json!({ "name": "ping" }))).unwrap();
        match call {
            MethodCall::ToolsCall(params) => {
                assert_eq!(params.name, "ping");
                assert_eq!(params.arguments, json!({}));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_tools_call_requires_name() {
        let err = MethodCall::parse("tools/call", Some(json!({ "arguments": {} }))).unwrap_err();
        assert_eq!(err.code(), -32602);
        let err = MethodCall::parse("tools/call", None).unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[test]
    fn test_initialize_tolerates_garbage() {
        let call = MethodCall::parse("initialize", Some(json!("nonsense"))).unwrap();
        assert!(matches!(call, MethodCall::Initialize(None)));
    }

    #[test]
    fn test_unknown_method_keeps_params() {
        let call = MethodCall::parse("resources/list", Some(json!([1]))).unwrap();
        assert_eq!(call.method(), "resources/list");
        assert!(matches!(call, MethodCall::Other { params: Some(_), .. }));
    }
}
