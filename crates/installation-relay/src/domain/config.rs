//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for runtime settings.  It is
//! populated from CLI arguments / environment variables in `main.rs`, or from
//! [`Default`] in tests.  Nothing in the domain reads the environment.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;

/// Port used when neither `--port` nor `PORT` is given.
pub const DEFAULT_PORT: u16 = 8080;

/// What the router does with an installation that has just been replaced by a
/// newer one.
///
/// Either way the newer connection takes the slot and the older one stops
/// being authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupersedePolicy {
    /// Leave the old connection open; its messages are dropped.
    #[default]
    Retain,
    /// Send a close frame to the old connection.
    Close,
}

/// Error returned when parsing an unknown [`SupersedePolicy`] name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown supersede policy '{0}' (expected 'retain' or 'close')")]
pub struct ParsePolicyError(pub String);

impl FromStr for SupersedePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(SupersedePolicy::Retain),
            "close" => Ok(SupersedePolicy::Close),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

impl fmt::Display for SupersedePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupersedePolicy::Retain => f.write_str("retain"),
            SupersedePolicy::Close => f.write_str("close"),
        }
    }
}

/// All runtime configuration for the relay.
///
/// # Example
///
/// ```rust
/// use installation_relay::domain::RelayConfig;
///
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address and port the WebSocket listener binds to.
    pub bind_addr: SocketAddr,

    /// Handling of an installation replaced by a newer one.
    pub on_supersede: SupersedePolicy,
}

impl Default for RelayConfig {
    /// | Field          | Default        |
    /// |----------------|----------------|
    /// | bind_addr      | `0.0.0.0:8080` |
    /// | on_supersede   | `Retain`       |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            on_supersede: SupersedePolicy::default(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
