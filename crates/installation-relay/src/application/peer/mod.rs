//! The connection handle seen by the routing layer.
//!
//! The transport (WebSocket in production, [`mock::MockPeer`] in tests) is
//! hidden behind the [`Peer`] trait.  The router needs exactly three things
//! from a connection: a stable identity, its liveness, and a way to queue a
//! frame.  Closing is only used for superseded installations.
//!
//! # Testability
//!
//! Because the registry and router are generic over `Peer`, the whole routing
//! rule set runs in unit tests without a runtime or sockets.

use uuid::Uuid;

use crate::domain::messages::Payload;
use crate::domain::role::Role;

pub mod mock;

/// Unique identity of one connection for its lifetime.
pub type ConnId = Uuid;

/// A live bidirectional connection.
pub trait Peer {
    /// Identity assigned when the connection was accepted.
    fn id(&self) -> ConnId;

    /// `true` while the channel is open and eligible to receive frames.
    fn is_open(&self) -> bool;

    /// Queues `payload` for delivery.  Best effort: failures are swallowed by
    /// the implementation.
    fn send(&self, payload: Payload);

    /// Asks the transport to close the connection.
    fn close(&self);
}

/// Identity and fixed role of the connection an event came from.
///
/// The role is captured once at handshake time and copied into every event,
/// so it cannot change for the life of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub id: ConnId,
    pub role: Role,
}

impl Origin {
    pub fn new(id: ConnId, role: Role) -> Self {
        Self { id, role }
    }
}
