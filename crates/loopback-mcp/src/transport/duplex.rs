//! In-memory duplex carrier.
//!
//! Two connected ports. Each direction is an unbounded, ordered, lossless
//! queue of framed envelopes. When every sender for a direction is gone the
//! receiving side sees end-of-stream, which is how a disconnect shows up.

use tokio::sync::mpsc;

use crate::types::{Envelope, McpError, McpResult};

use super::framing;

/// One framed envelope.
pub type Frame = String;

/// One end of a duplex carrier.
#[derive(Debug)]
pub struct DuplexPort {
    sender: PortSender,
    receiver: PortReceiver,
}

/// Create a connected pair of ports.
pub fn duplex() -> (DuplexPort, DuplexPort) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();

    let a = DuplexPort {
        sender: PortSender { tx: a_tx },
        receiver: PortReceiver { rx: a_rx },
    };
    let b = DuplexPort {
        sender: PortSender { tx: b_tx },
        receiver: PortReceiver { rx: b_rx },
    };
    (a, b)
}

impl DuplexPort {
    pub fn into_split(self) -> (PortSender, PortReceiver) {
        (self.sender, self.receiver)
    }

    /// True once the far end has dropped its receiving half.
    pub fn is_peer_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Outbound half of a port. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PortSender {
    tx: mpsc::UnboundedSender<Frame>,
}

impl PortSender {
    pub fn post(&self, envelope: &Envelope) -> McpResult<()> {
        let frame = framing::encode_envelope(envelope)?;
        self.post_frame(frame)
    }

    /// Post an already framed message as-is.
    pub fn post_frame(&self, frame: Frame) -> McpResult<()> {
        self.tx
            .send(frame)
            .map_err(|_| McpError::Transport("peer port is closed".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Inbound half of a port.
#[derive(Debug)]
pub struct PortReceiver {
    rx: mpsc::UnboundedReceiver<Frame>,
}

impl PortReceiver {
    /// Next raw frame, or `None` once the peer has gone away.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Next frame decoded as an envelope.
    pub async fn recv_envelope(&mut self) -> Option<McpResult<Envelope>> {
        let frame = self.recv().await?;
        Some(framing::parse_envelope(&frame))
    }
}
