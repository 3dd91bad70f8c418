//! Application layer for installation-relay.
//!
//! Knows *what* happens when connections come and go and when messages
//! arrive, but never touches a socket.
//!
//! # Responsibilities
//!
//! - The [`Peer`] abstraction over a live connection
//! - The [`ConnectionRegistry`]: who is connected as what
//! - The [`Router`]: fan-out, fan-in, and lifecycle notices
//!
//! # What does NOT belong here?
//!
//! - Accepting connections or WebSocket framing (infrastructure)
//! - Task spawning and the event channel (infrastructure)

pub mod error;
pub mod peer;
pub mod registry;
pub mod router;

pub use error::RelayError;
pub use peer::{ConnId, Origin, Peer};
pub use registry::ConnectionRegistry;
pub use router::{RelayEvent, Router};
