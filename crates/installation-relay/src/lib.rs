//! installation-relay library crate.
//!
//! This crate provides a WebSocket relay that connects exactly one display
//! "installation" with any number of remote "controllers" (phones, tablets,
//! kiosks).  Messages from the installation are broadcast to every controller;
//! messages from a controller go to the installation only.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Installation  (?type=installation)        Controllers  (no marker)
//!         ↕                                        ↕
//! [installation-relay]
//!   ├── domain/           Pure types: Role, Payload, ServerNotice, RelayConfig
//!   ├── application/      Peer trait, ConnectionRegistry, Router
//!   └── infrastructure/
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         ├── ws_peer/    Peer implementation over a WebSocket session
//!         └── hub/        Single event loop that owns the Router
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` only; it never sees a socket.
//! - `infrastructure` depends on all other layers plus `tokio` and `tungstenite`.
//!
//! The routing rules live entirely in `application`, so they can be exercised
//! with [`application::peer::mock::MockPeer`] instead of real sockets.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: connection registry and routing rules.
pub mod application;

/// Infrastructure layer: WebSocket server, peers, and the hub event loop.
pub mod infrastructure;
