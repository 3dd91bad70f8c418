//! The hub: one task that owns the [`Router`] and applies events in order.
//!
//! Session tasks run concurrently, but they never touch the registry.  They
//! push [`RelayEvent`]s into a single unbounded channel and the hub handles
//! them one at a time, to completion, in arrival order.  Because the router
//! handlers never await, no two handlers ever overlap and the registry needs
//! no lock.
//!
//! ```text
//! session A ─┐
//! session B ─┼──► mpsc ──► run_hub ──► Router ──► ConnectionRegistry
//! session C ─┘
//! ```

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::error::RelayError;
use crate::application::peer::Peer;
use crate::application::router::{RelayEvent, Router};

/// Sending side of the hub's event channel.  Cheap to clone; one per session.
pub struct HubHandle<P> {
    tx: UnboundedSender<RelayEvent<P>>,
}

impl<P> Clone for HubHandle<P> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<P> HubHandle<P> {
    /// Queues an event for the hub.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::HubClosed`] if the hub task has stopped.
    pub fn dispatch(&self, event: RelayEvent<P>) -> Result<(), RelayError> {
        self.tx.send(event).map_err(|_| RelayError::HubClosed)
    }
}

/// Spawns the hub on the current Tokio runtime.
///
/// The returned task finishes, yielding the router, once every [`HubHandle`]
/// has been dropped and the queue is drained.
pub fn spawn_hub<P>(router: Router<P>) -> (HubHandle<P>, JoinHandle<Router<P>>)
where
    P: Peer + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_hub(router, rx));
    (HubHandle { tx }, task)
}

/// Applies events to `router` until the channel closes.
pub async fn run_hub<P: Peer>(
    mut router: Router<P>,
    mut events: UnboundedReceiver<RelayEvent<P>>,
) -> Router<P> {
    while let Some(event) = events.recv().await {
        router.handle(event);
    }
    debug!("hub event channel closed; stopping");
    router
}
