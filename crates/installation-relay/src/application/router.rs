//! Router: turns connection events into sends.
//!
//! # Routing rules
//!
//! ```text
//! Installation ──msg──►  every open controller       (fan-out)
//! Controller   ──msg──►  the installation, if open   (fan-in, else dropped)
//! ```
//!
//! # Lifecycle notices
//!
//! | Event                         | Notice                     | Recipients          |
//! |-------------------------------|----------------------------|---------------------|
//! | any connect                   | `connectionAck`            | the new connection  |
//! | installation connects         | `installationConnected`    | open controllers    |
//! | current installation closes   | `installationDisconnected` | open controllers    |
//! | controller closes             | none                       |                     |
//!
//! Every send goes through a liveness check first; a peer that is not open is
//! skipped silently.  Transport errors are only logged: the close event that
//! follows is what removes the connection.

use tracing::{debug, error, info, warn};

use super::error::RelayError;
use super::peer::{Origin, Peer};
use super::registry::ConnectionRegistry;
use crate::domain::config::SupersedePolicy;
use crate::domain::messages::{Payload, ServerNotice};
use crate::domain::role::Role;

/// One unit of work for the router, produced by the transport layer.
#[derive(Debug)]
pub enum RelayEvent<P> {
    /// A connection finished its handshake with the given role.
    Connected { role: Role, peer: P },
    /// A frame arrived from `origin`.
    Message { origin: Origin, payload: Payload },
    /// The connection closed.  Raised exactly once per connection.
    Closed { origin: Origin },
    /// The transport reported an error.  A `Closed` event follows.
    Failed { origin: Origin, error: String },
}

/// Applies routing rules to a [`ConnectionRegistry`] it owns.
#[derive(Debug)]
pub struct Router<P> {
    registry: ConnectionRegistry<P>,
    on_supersede: SupersedePolicy,
}

impl<P: Peer> Router<P> {
    pub fn new(on_supersede: SupersedePolicy) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            on_supersede,
        }
    }

    /// Read access to the registry, for diagnostics and tests.
    pub fn registry(&self) -> &ConnectionRegistry<P> {
        &self.registry
    }

    /// Dispatches one event to the matching handler.
    pub fn handle(&mut self, event: RelayEvent<P>) {
        match event {
            RelayEvent::Connected { role, peer } => self.on_connect(role, peer),
            RelayEvent::Message { origin, payload } => {
                self.on_message(origin, payload);
            }
            RelayEvent::Closed { origin } => self.on_close(origin),
            RelayEvent::Failed { origin, error } => self.on_error(origin, &error),
        }
    }

    /// Registers a new connection and sends the connect-time notices.
    pub fn on_connect(&mut self, role: Role, peer: P) {
        let id = peer.id();
        info!("new client connected: {role} ({id})");

        let ack = ServerNotice::ack_for(role);

        match role {
            Role::Installation => {
                if let Some(previous) = self.registry.register_installation(peer) {
                    self.supersede(previous);
                }
                if let Some(installation) = self.registry.current_installation() {
                    send_notice(installation, &ack);
                }
                let notified = self.broadcast_notice(&ServerNotice::InstallationConnected);
                info!("installation {id} registered; notified {notified} controller(s)");
            }
            Role::Controller => {
                self.registry.register_controller(peer);
                if let Some(controller) = self.registry.controller(id) {
                    send_notice(controller, &ack);
                }
                info!(
                    "controller {id} registered; controllers total: {}",
                    self.registry.controller_count()
                );
            }
        }
    }

    /// Forwards `payload` according to the sender's role.
    ///
    /// Returns the number of peers the payload was handed to.
    pub fn on_message(&mut self, origin: Origin, payload: Payload) -> usize {
        match origin.role {
            Role::Installation => {
                if !self.registry.is_current_installation(origin.id) {
                    debug!(
                        "dropping {} byte(s) from superseded installation {}",
                        payload.len(),
                        origin.id
                    );
                    return 0;
                }
                let delivered = self.broadcast(&payload);
                debug!(
                    "installation → {delivered} controller(s): {} byte(s)",
                    payload.len()
                );
                delivered
            }
            Role::Controller => {
                let len = payload.len();
                let delivered = self
                    .registry
                    .current_installation()
                    .is_some_and(|installation| send_if_open(installation, payload));

                if delivered {
                    debug!("controller {} → installation: {len} byte(s)", origin.id);
                    1
                } else {
                    debug!(
                        "no open installation; dropping {len} byte(s) from controller {}",
                        origin.id
                    );
                    0
                }
            }
        }
    }

    /// Deregisters a closed connection and notifies controllers if the
    /// installation went away.
    pub fn on_close(&mut self, origin: Origin) {
        info!("client disconnected: {} ({})", origin.role, origin.id);

        match origin.role {
            Role::Installation => {
                if self.registry.deregister_installation(origin.id) {
                    let notified =
                        self.broadcast_notice(&ServerNotice::InstallationDisconnected);
                    info!("installation gone; notified {notified} controller(s)");
                } else {
                    debug!(
                        "installation {} was not current; slot left unchanged",
                        origin.id
                    );
                }
            }
            Role::Controller => {
                if self.registry.deregister_controller(origin.id) {
                    info!(
                        "controllers remaining: {}",
                        self.registry.controller_count()
                    );
                } else {
                    debug!("controller {} was already deregistered", origin.id);
                }
            }
        }
    }

    /// Reports a transport error.  Registry state is left alone.
    pub fn on_error(&self, origin: Origin, error: &str) {
        warn!(
            "transport error for {} ({}): {error}",
            origin.role, origin.id
        );
    }

    fn supersede(&self, previous: P) {
        match self.on_supersede {
            SupersedePolicy::Retain => {
                warn!(
                    "installation {} superseded; connection left open but no longer routed",
                    previous.id()
                );
            }
            SupersedePolicy::Close => {
                info!("installation {} superseded; closing it", previous.id());
                previous.close();
            }
        }
    }

    fn broadcast(&self, payload: &Payload) -> usize {
        self.registry
            .current_controllers()
            .filter(|controller| send_if_open(*controller, payload.clone()))
            .count()
    }

    fn broadcast_notice(&self, notice: &ServerNotice) -> usize {
        match encode(notice) {
            Some(payload) => self.broadcast(&payload),
            None => 0,
        }
    }
}

fn send_if_open<P: Peer>(peer: &P, payload: Payload) -> bool {
    if !peer.is_open() {
        return false;
    }
    peer.send(payload);
    true
}

fn send_notice<P: Peer>(peer: &P, notice: &ServerNotice) -> bool {
    match encode(notice) {
        Some(payload) => send_if_open(peer, payload),
        None => false,
    }
}

fn encode(notice: &ServerNotice) -> Option<Payload> {
    match notice.to_payload().map_err(RelayError::from) {
        Ok(payload) => Some(payload),
        Err(e) => {
            error!("{e}");
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::peer::mock::MockPeer;

    fn router() -> Router<MockPeer> {
        Router::new(SupersedePolicy::Retain)
    }

    fn connect(router: &mut Router<MockPeer>, role: Role) -> (MockPeer, Origin) {
        let peer = MockPeer::new();
        let origin = Origin::new(peer.id(), role);
        router.on_connect(role, peer.clone());
        (peer, origin)
    }

    #[test]
    fn test_controller_receives_controller_ack() {
        let mut router = router();

        let (controller, _) = connect(&mut router, Role::Controller);

        assert_eq!(
            controller.notices(),
            vec![ServerNotice::ack_for(Role::Controller)]
        );
    }

    #[test]
    fn test_installation_receives_installation_ack_only() {
        let mut router = router();

        let (installation, _) = connect(&mut router, Role::Installation);

        assert_eq!(
            installation.notices(),
            vec![ServerNotice::ack_for(Role::Installation)]
        );
    }

    #[test]
    fn test_installation_connect_notifies_existing_controllers() {
        // Arrange
        let mut router = router();
        let (controller, _) = connect(&mut router, Role::Controller);
        controller.take_sent();

        // Act
        connect(&mut router, Role::Installation);

        // Assert
        assert_eq!(
            controller.notices(),
            vec![ServerNotice::InstallationConnected]
        );
    }

    #[test]
    fn test_controller_message_without_installation_returns_zero() {
        let mut router = router();
        let (_, origin) = connect(&mut router, Role::Controller);

        assert_eq!(router.on_message(origin, Payload::from("Y")), 0);
    }

    #[test]
    fn test_closed_installation_does_not_receive_controller_message() {
        let mut router = router();
        let (installation, _) = connect(&mut router, Role::Installation);
        let (_, origin) = connect(&mut router, Role::Controller);
        installation.take_sent();
        installation.set_open(false);

        let delivered = router.on_message(origin, Payload::from("Y"));

        assert_eq!(delivered, 0);
        assert_eq!(installation.sends_while_closed(), 0);
    }

    #[test]
    fn test_handle_dispatches_events() {
        // Arrange
        let mut router = router();
        let installation = MockPeer::new();
        let controller = MockPeer::new();
        let i_origin = Origin::new(installation.id(), Role::Installation);
        let c_origin = Origin::new(controller.id(), Role::Controller);

        // Act
        router.handle(RelayEvent::Connected {
            role: Role::Controller,
            peer: controller.clone(),
        });
        router.handle(RelayEvent::Connected {
            role: Role::Installation,
            peer: installation.clone(),
        });
        router.handle(RelayEvent::Message {
            origin: i_origin,
            payload: Payload::from("X"),
        });
        router.handle(RelayEvent::Failed {
            origin: c_origin,
            error: "reset by peer".to_string(),
        });
        router.handle(RelayEvent::Closed { origin: c_origin });

        // Assert
        assert_eq!(controller.forwarded(), vec![Payload::from("X")]);
        assert_eq!(router.registry().controller_count(), 0);
        assert!(router.registry().is_current_installation(installation.id()));
    }

    #[test]
    fn test_error_alone_does_not_deregister() {
        let mut router = router();
        let (_, origin) = connect(&mut router, Role::Controller);

        router.on_error(origin, "boom");

        assert_eq!(router.registry().controller_count(), 1);
    }

    #[test]
    fn test_close_policy_closes_superseded_installation() {
        // Arrange
        let mut router = Router::new(SupersedePolicy::Close);
        let (first, _) = connect(&mut router, Role::Installation);

        // Act
        let (second, _) = connect(&mut router, Role::Installation);

        // Assert
        assert_eq!(first.close_requests(), 1);
        assert!(router.registry().is_current_installation(second.id()));
    }

    #[test]
    fn test_retain_policy_leaves_superseded_installation_open() {
        let mut router = router();
        let (first, _) = connect(&mut router, Role::Installation);

        connect(&mut router, Role::Installation);

        assert_eq!(first.close_requests(), 0);
        assert!(first.is_open());
    }
}
