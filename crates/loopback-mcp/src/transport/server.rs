//! Server endpoint — reads envelopes off a duplex port, hands them to the
//! dispatcher, and writes replies back.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::protocol::dispatcher::{panic_message, Dispatcher};
use crate::types::{
    Envelope, LogLevel, LogMessageParams, McpError, McpResult, RequestId,
    LOG_MESSAGE_NOTIFICATION, SERVER_NAME,
};

use super::duplex::{duplex, DuplexPort, PortReceiver, PortSender};
use super::framing;

/// Serves one dispatcher over any number of duplex ports.
#[derive(Debug, Clone)]
pub struct Server {
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Start answering on `port`. Each request is handled on its own task,
    /// so a slow tool does not hold up replies to later requests.
    pub fn serve(&self, port: DuplexPort) -> ServerHandle {
        let (sender, receiver) = port.into_split();
        let task = tokio::spawn(serve_loop(
            Arc::clone(&self.dispatcher),
            sender.clone(),
            receiver,
        ));
        ServerHandle { sender, task }
    }

    /// Create a fresh carrier, serve one end, and return the other.
    pub fn loopback(&self) -> (DuplexPort, ServerHandle) {
        let (client_port, server_port) = duplex();
        (client_port, self.serve(server_port))
    }
}

async fn serve_loop(dispatcher: Arc<Dispatcher>, sender: PortSender, mut receiver: PortReceiver) {
    tracing::info!("Server endpoint started");

    while let Some(frame) = receiver.recv().await {
        let envelope = match framing::parse_envelope(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Parse error: {e}");
                if let Err(e) = sender.post(&e.to_json_rpc_error(RequestId::Null)) {
                    tracing::debug!("Could not report parse error: {e}");
                }
                continue;
            }
        };

        tokio::spawn(answer(Arc::clone(&dispatcher), sender.clone(), envelope));
    }

    tracing::info!("Client closed the carrier, server endpoint stopping");
}

async fn answer(dispatcher: Arc<Dispatcher>, sender: PortSender, envelope: Envelope) {
    let id = envelope.is_request().then(|| envelope.id.clone()).flatten();
    reply_with(sender, id, async move { dispatcher.handle_message(envelope).await }).await;
}

/// Run `dispatch` on its own task and post what it produces. A panic turns
/// into an `InternalError` reply when `id` names a request.
async fn reply_with<F>(sender: PortSender, id: Option<RequestId>, dispatch: F)
where
    F: Future<Output = Option<Envelope>> + Send + 'static,
{
    let reply = match tokio::spawn(dispatch).await {
        Ok(reply) => reply,
        Err(e) => {
            let reason = panic_message(e);
            tracing::error!("Dispatch aborted: {reason}");
            id.map(|id| McpError::InternalError(reason).to_json_rpc_error(id))
        }
    };

    if let Some(reply) = reply {
        if let Err(e) = sender.post(&reply) {
            tracing::debug!("Dropping reply, client is gone: {e}");
        }
    }
}

/// Control over a running server endpoint.
#[derive(Debug)]
pub struct ServerHandle {
    sender: PortSender,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Push a notification to the client.
    pub fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        self.sender.post(&Envelope::notification(method, params))
    }

    /// Push a `notifications/message` log line to the client.
    pub fn log(&self, level: LogLevel, data: Value) -> McpResult<()> {
        let params = LogMessageParams {
            level,
            logger: Some(SERVER_NAME.to_string()),
            data,
        };
        self.notify(LOG_MESSAGE_NOTIFICATION, Some(serde_json::to_value(params)?))
    }

    /// Wait for the endpoint to stop on its own, which happens when the
    /// client end of the carrier goes away.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::debug!("Server endpoint ended abnormally: {e}");
        }
    }

    /// Stop reading requests and hang up on the client. The client sees
    /// end-of-stream once replies already being computed have been posted.
    pub fn stop(self) {
        self.task.abort();
        drop(self.sender);
        tracing::info!("Server endpoint stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn exploding_dispatch() -> Option<Envelope> {
        panic!("dispatch blew up")
    }

    #[tokio::test]
    async fn test_garbage_frame_gets_parse_error_with_null_id() {
        let server = Server::new(Dispatcher::with_builtin_tools());
        let (port, _handle) = server.loopback();
        let (tx, mut rx) = port.into_split();

        tx.post_frame("{ nope".to_string()).unwrap();
        let frame = rx.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["id"], serde_json::Value::Null);
        assert_eq!(value["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn test_notify_reaches_client_port() {
        let server = Server::new(Dispatcher::with_builtin_tools());
        let (port, handle) = server.loopback();
        let (_tx, mut rx) = port.into_split();

        handle
            .notify("notifications/tools/list_changed", Some(json!({})))
            .unwrap();
        let envelope = rx.recv_envelope().await.unwrap().unwrap();
        assert!(envelope.is_notification());
        assert_eq!(
            envelope.method.as_deref(),
            Some("notifications/tools/list_changed")
        );
    }

    #[tokio::test]
    async fn test_panicking_dispatch_replies_internal_error() {
        let (client, server) = duplex();
        let (server_tx, _server_rx) = server.into_split();
        let (_client_tx, mut client_rx) = client.into_split();

        reply_with(server_tx, Some(RequestId::Number(42)), exploding_dispatch()).await;

        let reply = client_rx.recv_envelope().await.unwrap().unwrap();
        assert_eq!(reply.id, Some(RequestId::Number(42)));
        let error = reply.error.unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.message.contains("dispatch blew up"), "got: {}", error.message);
    }

    #[tokio::test]
    async fn test_panicking_notification_dispatch_stays_silent() {
        let (client, server) = duplex();
        let (server_tx, _server_rx) = server.into_split();
        let (_client_tx, mut client_rx) = client.into_split();

        reply_with(server_tx, None, exploding_dispatch()).await;

        // Every sender for this direction is gone and nothing was posted.
        assert!(client_rx.recv().await.is_none());
    }
}
