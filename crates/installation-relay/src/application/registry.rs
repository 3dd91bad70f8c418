//! ConnectionRegistry: who is connected as what.
//!
//! Holds at most one installation and any number of controllers.  The
//! registry is owned by the [`Router`](crate::application::Router), which is in
//! turn owned by the hub event loop; it is never shared, so there is no lock.
//!
//! # Slot rules
//!
//! - Registering an installation overwrites the slot and hands back the
//!   previous occupant.  The previous connection is *not* closed here.
//! - Deregistering an installation only clears the slot when it still holds
//!   that same connection, so a late close from a replaced installation cannot
//!   evict its successor.

use std::collections::HashMap;

use super::peer::{ConnId, Peer};

/// In-memory registry of live connections, keyed by [`ConnId`].
#[derive(Debug)]
pub struct ConnectionRegistry<P> {
    installation: Option<P>,
    controllers: HashMap<ConnId, P>,
}

impl<P> Default for ConnectionRegistry<P> {
    fn default() -> Self {
        Self {
            installation: None,
            controllers: HashMap::new(),
        }
    }
}

impl<P: Peer> ConnectionRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `peer` in the installation slot, returning whatever was there.
    pub fn register_installation(&mut self, peer: P) -> Option<P> {
        self.installation.replace(peer)
    }

    /// Adds `peer` to the controller set.
    pub fn register_controller(&mut self, peer: P) {
        self.controllers.insert(peer.id(), peer);
    }

    /// Clears the installation slot if it holds `id`.
    ///
    /// Returns `true` when the slot was cleared.
    pub fn deregister_installation(&mut self, id: ConnId) -> bool {
        match &self.installation {
            Some(current) if current.id() == id => {
                self.installation = None;
                true
            }
            _ => false,
        }
    }

    /// Removes controller `id`.  Returns `true` if it was present.
    pub fn deregister_controller(&mut self, id: ConnId) -> bool {
        self.controllers.remove(&id).is_some()
    }

    /// The current installation, if any.
    pub fn current_installation(&self) -> Option<&P> {
        self.installation.as_ref()
    }

    /// Returns `true` if `id` currently occupies the installation slot.
    pub fn is_current_installation(&self, id: ConnId) -> bool {
        self.installation.as_ref().is_some_and(|p| p.id() == id)
    }

    /// All registered controllers at call time, in no particular order.
    pub fn current_controllers(&self) -> impl Iterator<Item = &P> + '_ {
        self.controllers.values()
    }

    /// Looks up a registered controller.
    pub fn controller(&self, id: ConnId) -> Option<&P> {
        self.controllers.get(&id)
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.len()
    }
}
