//! Client channel — sends envelopes over a duplex port and pairs each
//! response with the request that is waiting for it.
//!
//! Every outgoing request gets a pending entry keyed by its id. The reader
//! task removes the entry when the matching response arrives and hands the
//! outcome to the waiting caller through a oneshot. Responses may arrive in
//! any order; the id is the only thing that pairs them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::types::{Envelope, EnvelopeKind, McpError, McpResult, RequestId};

use super::duplex::{DuplexPort, PortReceiver, PortSender};
use super::framing;

/// Callback for a server-to-client notification. Receives the params.
pub type NotificationHandler = Arc<dyn Fn(Option<Value>) + Send + Sync>;

type Outcome = McpResult<Value>;

/// Where a channel is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Bound to a port that has not been activated yet.
    Idle,
    Connected,
    /// Torn down locally or by the peer. Terminal.
    Closed,
}

enum Link {
    Idle(DuplexPort),
    Connected {
        sender: PortSender,
        reader: JoinHandle<()>,
    },
    Closed,
}

impl Link {
    fn state(&self) -> LinkState {
        match self {
            Link::Idle(_) => LinkState::Idle,
            Link::Connected { .. } => LinkState::Connected,
            Link::Closed => LinkState::Closed,
        }
    }
}

struct PendingEntry {
    slot: u64,
    responder: oneshot::Sender<Outcome>,
}

#[derive(Default)]
struct PendingTable {
    entries: HashMap<RequestId, PendingEntry>,
    next_slot: u64,
}

struct ChannelInner {
    link: Mutex<Link>,
    pending: Mutex<PendingTable>,
    notification_handlers: Mutex<HashMap<String, NotificationHandler>>,
    request_timeout: Option<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bidirectional channel with request/response correlation.
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl Channel {
    /// Bind a channel to one end of a duplex carrier. Requests wait for
    /// their response indefinitely.
    pub fn new(port: DuplexPort) -> Self {
        Self::with_timeout(port, None)
    }

    /// Bind a channel whose requests give up after `request_timeout`.
    pub fn with_timeout(port: DuplexPort, request_timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                link: Mutex::new(Link::Idle(port)),
                pending: Mutex::new(PendingTable::default()),
                notification_handlers: Mutex::new(HashMap::new()),
                request_timeout,
            }),
        }
    }

    pub fn state(&self) -> LinkState {
        lock(&self.inner.link).state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LinkState::Connected
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.inner.request_timeout
    }

    /// Number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pending).entries.len()
    }

    /// Activate the carrier and start the reader task.
    pub async fn connect(&self) -> McpResult<()> {
        let mut link = lock(&self.inner.link);
        let port = match std::mem::replace(&mut *link, Link::Closed) {
            Link::Idle(port) => port,
            Link::Connected { sender, reader } => {
                *link = Link::Connected { sender, reader };
                return Err(McpError::NotConnectable("already connected".to_string()));
            }
            Link::Closed => {
                return Err(McpError::NotConnectable("channel is closed".to_string()));
            }
        };

        if port.is_peer_closed() {
            return Err(McpError::NotConnectable(
                "remote end of the carrier is gone".to_string(),
            ));
        }

        let (sender, receiver) = port.into_split();
        let reader = tokio::spawn(read_loop(Arc::downgrade(&self.inner), receiver));
        *link = Link::Connected { sender, reader };

        tracing::info!("Channel connected");
        Ok(())
    }

    /// Send an envelope.
    ///
    /// With an id, registers a pending entry and waits for the matching
    /// response: its result, or its error as a typed failure. Without an id
    /// (a notification), returns `Value::Null` once the carrier has it.
    pub async fn send(&self, envelope: Envelope) -> McpResult<Value> {
        let (sender, waiter) = self.inner.begin(envelope.id.clone())?;

        let Some((guard, response)) = waiter else {
            sender.post(&envelope)?;
            return Ok(Value::Null);
        };

        sender.post(&envelope)?;
        drop(sender);

        let outcome = match self.inner.request_timeout {
            Some(after) => match tokio::time::timeout(after, response).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!("Request {} timed out after {after:?}", guard.id);
                    return Err(McpError::Timeout {
                        id: guard.id.clone(),
                        after,
                    });
                }
            },
            None => response.await,
        };

        // The responder is only dropped unanswered when the table is torn down.
        outcome.unwrap_or_else(|_| Err(McpError::Disconnected(guard.id.clone())))
    }

    /// Send a notification built from `method` and `params`.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> McpResult<()> {
        self.send(Envelope::notification(method, params)).await?;
        Ok(())
    }

    /// Route server-to-client notifications named `method` to `handler`.
    /// Replaces any earlier handler for the same method.
    pub fn on_notification<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(Option<Value>) + Send + Sync + 'static,
    {
        lock(&self.inner.notification_handlers).insert(method.into(), Arc::new(handler));
    }

    /// Tear down the carrier. Requests still waiting are rejected with
    /// `Disconnected`.
    pub fn disconnect(&self) {
        if let Link::Connected { reader, .. } = self.inner.close() {
            reader.abort();
        }
        tracing::info!("Channel disconnected");
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        if let Link::Connected { reader, .. } = self.inner.close() {
            reader.abort();
        }
    }
}

/// Removes its pending entry if the waiting caller gives up first.
struct PendingGuard {
    inner: Arc<ChannelInner>,
    id: RequestId,
    slot: u64,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = lock(&self.inner.pending);
        if pending
            .entries
            .get(&self.id)
            .is_some_and(|entry| entry.slot == self.slot)
        {
            pending.entries.remove(&self.id);
        }
    }
}

impl ChannelInner {
    /// Check the link and, for a request, register its pending entry.
    ///
    /// The link lock is held across registration so a concurrent teardown
    /// either refuses the send or sees the entry and rejects it.
    #[allow(clippy::type_complexity)]
    fn begin(
        self: &Arc<Self>,
        id: Option<RequestId>,
    ) -> McpResult<(PortSender, Option<(PendingGuard, oneshot::Receiver<Outcome>)>)> {
        let link = lock(&self.link);
        let sender = match &*link {
            Link::Connected { sender, .. } => sender.clone(),
            _ => return Err(McpError::NotConnected),
        };

        let Some(id) = id else {
            return Ok((sender, None));
        };

        let mut pending = lock(&self.pending);
        if pending.entries.contains_key(&id) {
            return Err(McpError::DuplicateRequestId(id));
        }

        let slot = pending.next_slot;
        pending.next_slot += 1;
        let (responder, response) = oneshot::channel();
        pending
            .entries
            .insert(id.clone(), PendingEntry { slot, responder });

        let guard = PendingGuard {
            inner: Arc::clone(self),
            id,
            slot,
        };
        Ok((sender, Some((guard, response))))
    }

    /// Handle one inbound frame.
    fn receive(&self, frame: &str) {
        let envelope = match framing::parse_envelope(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Dropping undecodable frame: {e}");
                return;
            }
        };

        match envelope.kind() {
            EnvelopeKind::Response => self.resolve(envelope),
            EnvelopeKind::Notification => self.route_notification(envelope),
            EnvelopeKind::Request => {
                tracing::debug!(
                    "Dropping server-to-client request {:?}",
                    envelope.method.as_deref().unwrap_or_default()
                );
            }
            EnvelopeKind::Malformed => {
                tracing::debug!("Dropping envelope that is neither response nor notification");
            }
        }
    }

    fn resolve(&self, response: Envelope) {
        let Some(id) = response.id else {
            return;
        };

        let Some(entry) = lock(&self.pending).entries.remove(&id) else {
            tracing::debug!("No pending request for response {id}; dropping");
            return;
        };

        let outcome = match (response.result, response.error) {
            (_, Some(error)) => Err(McpError::from_error_object(error)),
            (result, None) => Ok(result.unwrap_or(Value::Null)),
        };

        if entry.responder.send(outcome).is_err() {
            tracing::debug!("Caller for request {id} stopped waiting");
        }
    }

    fn route_notification(&self, notification: Envelope) {
        let Some(method) = notification.method else {
            return;
        };

        let handler = lock(&self.notification_handlers).get(&method).cloned();
        match handler {
            Some(handler) => handler(notification.params),
            None => tracing::debug!("No handler for notification {method}; dropping"),
        }
    }

    /// Mark the link closed and reject everything still pending.
    /// Returns the previous link so the caller can stop its reader.
    fn close(&self) -> Link {
        let previous = std::mem::replace(&mut *lock(&self.link), Link::Closed);

        let drained: Vec<(RequestId, PendingEntry)> =
            lock(&self.pending).entries.drain().collect();
        if !drained.is_empty() {
            tracing::debug!("Rejecting {} pending request(s)", drained.len());
        }
        for (id, entry) in drained {
            let _ = entry.responder.send(Err(McpError::Disconnected(id)));
        }

        previous
    }
}

async fn read_loop(inner: Weak<ChannelInner>, mut receiver: PortReceiver) {
    while let Some(frame) = receiver.recv().await {
        let Some(inner) = inner.upgrade() else {
            return;
        };
        inner.receive(&frame);
    }

    tracing::info!("Remote end closed the channel");
    if let Some(inner) = inner.upgrade() {
        // The reader is this task; dropping its handle just detaches it.
        drop(inner.close());
    }
}
