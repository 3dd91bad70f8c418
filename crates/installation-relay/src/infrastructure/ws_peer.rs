//! [`Peer`] implementation backed by a WebSocket session.
//!
//! The router never writes to the socket directly.  Each session owns a
//! writer task draining an unbounded queue; `WsPeer::send` just pushes a frame
//! onto that queue.  This keeps the hub loop from ever awaiting on a slow
//! client.
//!
//! # Liveness
//!
//! A `WsPeer` is open until either:
//!
//! - the session's reader saw the connection end ([`WsPeer::mark_closed`]), or
//! - the writer task exited (send failure), which drops the queue receiver.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::debug;
use uuid::Uuid;

use crate::application::peer::{ConnId, Peer};
use crate::domain::messages::Payload;

/// Handle to one WebSocket session's outbound queue.
#[derive(Debug, Clone)]
pub struct WsPeer {
    id: ConnId,
    outbound: UnboundedSender<WsMessage>,
    open: Arc<AtomicBool>,
}

impl WsPeer {
    /// Wraps the sending side of a session's outbound queue.
    pub fn new(outbound: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            outbound,
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flags the session as ended.  Shared by every clone.
    pub fn mark_closed(&self) {
        self.open.store(false, Ordering::Release);
    }
}

impl Peer for WsPeer {
    fn id(&self) -> ConnId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.outbound.is_closed()
    }

    fn send(&self, payload: Payload) {
        if self.outbound.send(payload_to_frame(payload)).is_err() {
            debug!("peer {}: outbound queue closed; frame dropped", self.id);
        }
    }

    fn close(&self) {
        if self.outbound.send(WsMessage::Close(None)).is_err() {
            debug!("peer {}: already closed", self.id);
        }
        self.mark_closed();
    }
}

/// Converts a routed payload into the frame kind it arrived as.
pub fn payload_to_frame(payload: Payload) -> WsMessage {
    match payload {
        Payload::Text(text) => WsMessage::Text(text),
        Payload::Binary(bytes) => WsMessage::Binary(bytes),
    }
}

/// Extracts a routable payload from an inbound frame.
///
/// Control frames (ping, pong, close, raw) are transport business and yield
/// `None`.
pub fn frame_to_payload(frame: WsMessage) -> Option<Payload> {
    match frame {
        WsMessage::Text(text) => Some(Payload::Text(text)),
        WsMessage::Binary(bytes) => Some(Payload::Binary(bytes)),
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) | WsMessage::Frame(_) => {
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
