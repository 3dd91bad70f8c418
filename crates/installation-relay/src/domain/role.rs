//! Connection roles.
//!
//! Every connection is classified exactly once, while the WebSocket handshake
//! is being processed, and keeps that role until it closes.  The only input is
//! the query string of the upgrade request:
//!
//! ```text
//! ws://relay:8080/?type=installation   →  Role::Installation
//! ws://relay:8080/                      →  Role::Controller
//! ws://relay:8080/?name=phone-3         →  Role::Controller
//! ```

use std::fmt;

/// Query parameter key carrying the role marker.
pub const ROLE_QUERY_KEY: &str = "type";

/// Query parameter value that marks the installation.
pub const INSTALLATION_MARKER: &str = "installation";

/// The role a connection plays for its entire lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The single display-side connection.  Its messages fan out to every
    /// controller.
    Installation,
    /// Any other connection.  Its messages fan in to the installation.
    Controller,
}

impl Role {
    /// Classifies a connection from the query string of its upgrade request.
    ///
    /// `query` is the part after `?`, without the `?` itself.  The connection
    /// is an installation when any `key=value` pair is exactly
    /// `type=installation`; a missing or unrelated query yields
    /// [`Role::Controller`].
    pub fn from_query(query: Option<&str>) -> Self {
        let is_installation = query
            .into_iter()
            .flat_map(|q| q.split('&'))
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == ROLE_QUERY_KEY && value == INSTALLATION_MARKER);

        if is_installation {
            Role::Installation
        } else {
            Role::Controller
        }
    }

    /// Text carried by the `connectionAck` notice for this role.
    pub fn ack_message(self) -> &'static str {
        match self {
            Role::Installation => "Connected to relay as Installation",
            Role::Controller => "Connected to relay as Controller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Installation => f.write_str("installation"),
            Role::Controller => f.write_str("controller"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
