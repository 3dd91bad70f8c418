//! Infrastructure layer for installation-relay.
//!
//! Handles all I/O: accepting WebSocket connections, moving frames between
//! sockets and the router, and running the hub event loop.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener and performing the WebSocket upgrade
//! - Reading the role marker from the upgrade request
//! - Spawning per-session reader/writer tasks
//! - Owning the single hub task that drives the [`Router`](crate::application::Router)
//! - Honouring the graceful shutdown flag
//!
//! # What does NOT belong here?
//!
//! - Routing rules (application layer)
//! - Message and role definitions (domain layer)
//! - CLI / environment parsing (`main.rs`)

pub mod hub;
pub mod ws_peer;
pub mod ws_server;

pub use ws_server::{run_server, serve};
