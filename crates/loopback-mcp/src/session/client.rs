//! Client session — the handshake, typed tool calls, and lifecycle state on
//! top of a [`Channel`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

use serde_json::Value;

use crate::config::ClientConfig;
use crate::protocol::negotiation::check_server_version;
use crate::transport::{Channel, DuplexPort, LinkState};
use crate::types::{
    methods, Envelope, InitializeParams, InitializeResult, McpError, McpResult, RequestId,
    ToolCallParams, ToolCallResult, ToolDefinition, ToolListResult, INITIALIZED_NOTIFICATION,
};

use super::state::SessionState;

/// A client's view of one connection to a server.
pub struct Session {
    channel: Channel,
    config: ClientConfig,
    state: RwLock<SessionState>,
    next_id: AtomicI64,
    server_info: RwLock<Option<InitializeResult>>,
}

impl Session {
    pub fn new(channel: Channel) -> Self {
        Self::with_config(channel, ClientConfig::default())
    }

    /// Bind a session to `channel`. The channel's own timeout applies to
    /// requests; `config` supplies the handshake identity.
    pub fn with_config(channel: Channel, config: ClientConfig) -> Self {
        Self {
            channel,
            config,
            state: RwLock::new(SessionState::Uninitialized),
            next_id: AtomicI64::new(1),
            server_info: RwLock::new(None),
        }
    }

    /// Build the channel from `port` using the timeout in `config`.
    pub fn from_port(port: DuplexPort, config: ClientConfig) -> Self {
        let channel = Channel::with_timeout(port, config.request_timeout);
        Self::with_config(channel, config)
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current lifecycle state. A channel closed from either side reads as
    /// `Disconnected`.
    pub fn state(&self) -> SessionState {
        if self.channel.state() == LinkState::Closed {
            return SessionState::Disconnected;
        }
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// What the server said about itself during the handshake.
    pub fn server_info(&self) -> Option<InitializeResult> {
        self.server_info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Activate the channel and run the initialize handshake.
    ///
    /// The session only becomes `Initialized` once the server has answered
    /// and the `notifications/initialized` notification is on the carrier.
    /// A failed handshake leaves the session `Uninitialized` with its channel
    /// already activated, so it cannot be connected again; call
    /// [`Session::disconnect`] and bind a new session to a fresh carrier.
    pub async fn connect(&self) -> McpResult<InitializeResult> {
        self.channel.connect().await?;

        let params = InitializeParams::new(
            self.config.protocol_version.clone(),
            self.config.client_info.clone(),
        );
        let result = match self.handshake(params).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Initialize handshake failed: {e}");
                return Err(McpError::InitializationFailed(e.to_string()));
            }
        };

        check_server_version(&result, &self.config.protocol_version);
        *self
            .server_info
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
        self.set_state(SessionState::Initialized);
        Ok(result)
    }

    async fn handshake(&self, params: InitializeParams) -> McpResult<InitializeResult> {
        let value = self
            .request(methods::INITIALIZE, Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult = serde_json::from_value(value)?;

        self.channel.notify(INITIALIZED_NOTIFICATION, None).await?;
        Ok(result)
    }

    /// Summaries of every tool the server offers.
    pub async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
        self.ensure_initialized()?;
        let value = self.request(methods::TOOLS_LIST, None).await?;
        let result: ToolListResult = serde_json::from_value(value)?;
        Ok(result.tools)
    }

    /// Invoke the tool `name` with `arguments`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolCallResult> {
        self.ensure_initialized()?;
        let params = ToolCallParams::new(name, arguments);
        let value = self
            .request(methods::TOOLS_CALL, Some(serde_json::to_value(params)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Route server notifications named `method` to `handler`.
    pub fn on_notification<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        self.channel.on_notification(method, handler);
    }

    /// Tear down the channel. Later operations fail with `NotInitialized`.
    pub fn disconnect(&self) {
        self.channel.disconnect();
        self.set_state(SessionState::Disconnected);
    }

    fn ensure_initialized(&self) -> McpResult<()> {
        if self.state().is_initialized() {
            Ok(())
        } else {
            Err(McpError::NotInitialized)
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn request(&self, method: &str, params: Option<Value>) -> McpResult<Value> {
        let id = self.next_request_id();
        tracing::debug!("Request {id}: {method}");
        self.channel.send(Envelope::request(id, method, params)).await
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
