//! Messages that cross the relay.
//!
//! There are two kinds:
//!
//! - [`Payload`]: an opaque frame from one party, forwarded verbatim to the
//!   other side.  The relay never parses it.
//! - [`ServerNotice`]: a small JSON envelope the relay itself sends to tell
//!   parties about registration and installation presence.
//!
//! # Notice wire format
//!
//! Every notice is a JSON object with a `"type"` discriminant:
//!
//! ```json
//! {"type":"connectionAck","message":"Connected to relay as Controller"}
//! {"type":"installationConnected"}
//! {"type":"installationDisconnected"}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::role::Role;

/// An opaque application frame.
///
/// The frame kind is preserved so a binary frame from a controller reaches the
/// installation as a binary frame with identical bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A UTF-8 text frame.
    Text(String),
    /// A binary frame.
    Binary(Vec<u8>),
}

impl Payload {
    /// Size of the frame body in bytes.
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(text) => text.len(),
            Payload::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the frame body is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the text body, or `None` for binary frames.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(_) => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes)
    }
}

/// Notices generated by the relay itself (never forwarded from a peer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerNotice {
    /// Sent once to every newly registered connection.
    ConnectionAck {
        /// Human-readable confirmation naming the assigned role.
        message: String,
    },
    /// Sent to open controllers when an installation registers.
    InstallationConnected,
    /// Sent to open controllers when the current installation closes.
    InstallationDisconnected,
}

impl ServerNotice {
    /// Builds the `connectionAck` for a connection registered as `role`.
    pub fn ack_for(role: Role) -> Self {
        ServerNotice::ConnectionAck {
            message: role.ack_message().to_string(),
        }
    }

    /// Encodes the notice as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_payload(&self) -> Result<Payload, serde_json::Error> {
        serde_json::to_string(self).map(Payload::Text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
