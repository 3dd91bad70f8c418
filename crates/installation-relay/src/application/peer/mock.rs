//! Mock peer for unit and integration testing.
//!
//! A [`MockPeer`] records every frame it is asked to send.  Clones share
//! state, so a test can hand one clone to the router and keep another to
//! inspect deliveries or flip liveness.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use uuid::Uuid;

use super::{ConnId, Peer};
use crate::domain::messages::{Payload, ServerNotice};

/// A recording implementation of [`Peer`].
#[derive(Debug, Clone)]
pub struct MockPeer {
    id: ConnId,
    open: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<Payload>>>,
    sends_while_closed: Arc<AtomicUsize>,
    close_requests: Arc<AtomicUsize>,
}

impl MockPeer {
    /// Creates an open peer with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            open: Arc::new(AtomicBool::new(true)),
            sent: Arc::new(Mutex::new(Vec::new())),
            sends_while_closed: Arc::new(AtomicUsize::new(0)),
            close_requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Changes the liveness reported by [`Peer::is_open`].
    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    /// All frames delivered so far, oldest first.
    pub fn sent(&self) -> Vec<Payload> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    /// Removes and returns all frames delivered so far.
    pub fn take_sent(&self) -> Vec<Payload> {
        std::mem::take(&mut *self.sent.lock().expect("lock poisoned"))
    }

    /// Delivered frames that decode as [`ServerNotice`]s.
    pub fn notices(&self) -> Vec<ServerNotice> {
        self.sent()
            .iter()
            .filter_map(Payload::as_text)
            .filter_map(|text| serde_json::from_str(text).ok())
            .collect()
    }

    /// Delivered frames that are not server notices.
    pub fn forwarded(&self) -> Vec<Payload> {
        self.sent()
            .into_iter()
            .filter(|payload| {
                payload
                    .as_text()
                    .map_or(true, |text| serde_json::from_str::<ServerNotice>(text).is_err())
            })
            .collect()
    }

    /// Number of times `send` was called while the peer reported closed.
    pub fn sends_while_closed(&self) -> usize {
        self.sends_while_closed.load(Ordering::SeqCst)
    }

    /// Number of times `close` was called.
    pub fn close_requests(&self) -> usize {
        self.close_requests.load(Ordering::SeqCst)
    }
}

impl Default for MockPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl Peer for MockPeer {
    fn id(&self) -> ConnId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn send(&self, payload: Payload) {
        if !self.is_open() {
            self.sends_while_closed.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.sent.lock().expect("lock poisoned").push(payload);
    }

    fn close(&self) {
        self.close_requests.fetch_add(1, Ordering::SeqCst);
        self.set_open(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_peer_records_sends() {
        // Arrange
        let peer = MockPeer::new();

        // Act
        peer.send(Payload::from("a"));
        peer.send(Payload::from(vec![1u8]));

        // Assert
        assert_eq!(
            peer.sent(),
            vec![Payload::from("a"), Payload::Binary(vec![1])]
        );
    }

    #[test]
    fn test_clones_share_state() {
        let peer = MockPeer::new();
        let handle = peer.clone();

        peer.send(Payload::from("x"));

        assert_eq!(handle.id(), peer.id());
        assert_eq!(handle.sent().len(), 1);
    }

    #[test]
    fn test_send_while_closed_is_counted_not_recorded() {
        let peer = MockPeer::new();
        peer.set_open(false);

        peer.send(Payload::from("dropped"));

        assert!(peer.sent().is_empty());
        assert_eq!(peer.sends_while_closed(), 1);
    }

    #[test]
    fn test_close_marks_peer_not_open() {
        let peer = MockPeer::new();
        peer.close();
        assert!(!peer.is_open());
        assert_eq!(peer.close_requests(), 1);
    }

    #[test]
    fn test_notices_and_forwarded_are_separated() {
        // Arrange
        let peer = MockPeer::new();
        peer.send(ServerNotice::InstallationConnected.to_payload().unwrap());
        peer.send(Payload::from(r#"{"type":"move","x":1}"#));
        peer.send(Payload::from("plain"));

        // Assert
        assert_eq!(peer.notices(), vec![ServerNotice::InstallationConnected]);
        assert_eq!(
            peer.forwarded(),
            vec![
                Payload::from(r#"{"type":"move","x":1}"#),
                Payload::from("plain")
            ]
        );
    }

    #[test]
    fn test_take_sent_drains() {
        let peer = MockPeer::new();
        peer.send(Payload::from("a"));
        assert_eq!(peer.take_sent().len(), 1);
        assert!(peer.sent().is_empty());
    }
}
