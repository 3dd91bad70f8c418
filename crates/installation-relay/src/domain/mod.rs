//! Domain layer for installation-relay.
//!
//! Pure types with no dependencies on I/O, networking, or async runtimes.
//!
//! # What belongs in the domain layer?
//!
//! - Connection roles and how they are derived from the handshake
//! - The opaque forwarded payload and the relay's own notice envelope
//! - Configuration structures
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - Environment variable reading (that is done in `main.rs`)

pub mod config;
pub mod messages;
pub mod role;

pub use config::{RelayConfig, SupersedePolicy};
pub use messages::{Payload, ServerNotice};
pub use role::Role;
