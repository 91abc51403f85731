//! Main request dispatcher — receives one envelope, routes it to a built-in
//! method or a registered tool, and answers with exactly one envelope.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinError;

use crate::tools::ToolRegistry;
use crate::types::*;

use super::negotiation::negotiate;
use super::validator::validate_envelope;

/// Stateless server core. Owns the tool registry it dispatches into.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn with_builtin_tools() -> Self {
        Self::new(ToolRegistry::with_builtin_tools())
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one incoming envelope.
    ///
    /// Requests always yield `Some` response carrying the request's id;
    /// notifications and stray responses yield `None`.
    pub async fn handle_message(&self, envelope: Envelope) -> Option<Envelope> {
        match validate_envelope(&envelope) {
            Ok(EnvelopeKind::Request) => Some(self.handle_request(envelope).await),
            Ok(EnvelopeKind::Notification) => {
                self.handle_notification(envelope);
                None
            }
            Ok(EnvelopeKind::Response) | Ok(EnvelopeKind::Malformed) => {
                tracing::warn!("Received unexpected response envelope from client");
                None
            }
            Err(e) => match envelope.id {
                Some(id) => Some(e.to_json_rpc_error(id)),
                None => {
                    tracing::warn!("Dropping invalid envelope without id: {e}");
                    None
                }
            },
        }
    }

    async fn handle_request(&self, request: Envelope) -> Envelope {
        let id = request.id.unwrap_or(RequestId::Null);
        let method = request.method.unwrap_or_default();
        tracing::debug!("Request {id}: {method}");

        let result = match MethodCall::parse(&method, request.params) {
            Ok(call) => self.dispatch(call).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => Envelope::success(id, value),
            Err(e) => {
                tracing::debug!("Request {id} failed: {e}");
                e.to_json_rpc_error(id)
            }
        }
    }

    async fn dispatch(&self, call: MethodCall) -> McpResult<Value> {
        match call {
            MethodCall::Initialize(params) => self.handle_initialize(params),
            MethodCall::ToolsList => self.handle_tools_list(),
            MethodCall::ToolsCall(params) => self.handle_tools_call(params).await,
            MethodCall::Other { method, .. } => Err(McpError::MethodNotFound(method)),
        }
    }

    fn handle_notification(&self, notification: Envelope) {
        match notification.method.as_deref() {
            Some(INITIALIZED_NOTIFICATION) => tracing::info!("MCP handshake complete"),
            Some(method) => tracing::debug!("Unknown notification: {method}"),
            None => {}
        }
    }

    fn handle_initialize(&self, params: Option<InitializeParams>) -> McpResult<Value> {
        let result = negotiate(params);
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    fn handle_tools_list(&self) -> McpResult<Value> {
        let result = ToolListResult {
            tools: self.registry.list(),
        };
        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }

    async fn handle_tools_call(&self, params: ToolCallParams) -> McpResult<Value> {
        let ToolCallParams { name, arguments } = params;
        let tool = self
            .registry
            .lookup(&name)
            .ok_or_else(|| McpError::ToolNotFound(name.clone()))?;

        // The handler runs on its own task so a panic is contained to this call.
        let outcome = tokio::spawn(tool.call(arguments)).await;
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::warn!("Tool '{name}' failed: {e}");
                return Err(McpError::ToolExecutionFailed {
                    tool: name,
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                let reason = panic_message(e);
                tracing::error!("Tool '{name}' aborted: {reason}");
                return Err(McpError::ToolExecutionFailed { tool: name, reason });
            }
        };

        serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
    }
}

/// Describe why a spawned task did not finish.
pub(crate) fn panic_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task was cancelled".to_string();
    }

    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
