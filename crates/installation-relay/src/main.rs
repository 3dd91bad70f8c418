//! Installation relay: entry point.
//!
//! This binary accepts WebSocket connections from one display installation
//! and any number of remote controllers, and relays messages between them.
//!
//! # Usage
//!
//! ```text
//! installation-relay [OPTIONS]
//!
//! Options:
//!   --port         <PORT>    Listening port [default: 8080]
//!   --bind         <ADDR>    Listening interface [default: 0.0.0.0]
//!   --on-supersede <POLICY>  retain | close [default: retain]
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable             | Default   | Description                          |
//! |----------------------|-----------|--------------------------------------|
//! | `PORT`               | `8080`    | Listening port (set by most PaaS)    |
//! | `RELAY_BIND`         | `0.0.0.0` | Listening interface                  |
//! | `RELAY_ON_SUPERSEDE` | `retain`  | What to do with a replaced installation |
//!
//! # Connecting
//!
//! ```text
//! ws://host:8080/?type=installation   the display
//! ws://host:8080/                      a controller
//! ```

use std::net::{IpAddr, SocketAddr};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use installation_relay::domain::config::DEFAULT_PORT;
use installation_relay::domain::{RelayConfig, SupersedePolicy};
use installation_relay::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// WebSocket relay between one display installation and many controllers.
#[derive(Debug, Parser)]
#[command(
    name = "installation-relay",
    about = "WebSocket relay between one display installation and many controllers",
    version
)]
struct Cli {
    /// TCP port for the WebSocket listener.
    #[arg(long, default_value_t = DEFAULT_PORT, env = "PORT")]
    port: u16,

    /// IP address to bind the listener to.
    ///
    /// `0.0.0.0` accepts connections on every interface; `127.0.0.1` only
    /// local ones.
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_BIND")]
    bind: String,

    /// What to do with an installation that is replaced by a newer one:
    /// `retain` leaves it connected (unrouted), `close` disconnects it.
    #[arg(long, default_value = "retain", env = "RELAY_ON_SUPERSEDE")]
    on_supersede: SupersedePolicy,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--bind` is not a valid IP address.
    fn into_relay_config(self) -> anyhow::Result<RelayConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        Ok(RelayConfig {
            bind_addr: SocketAddr::new(ip, self.port),
            on_supersede: self.on_supersede,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` overrides the default `info` level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_relay_config()?;

    info!(
        "installation relay starting — listen={}, on_supersede={}",
        config.bind_addr, config.on_supersede
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config, running).await?;

    info!("installation relay stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_port_default_matches_relay_config_default() {
        // Arrange: with PORT set the env value wins, not the default.
        if std::env::var_os("PORT").is_some() {
            return;
        }

        // Act
        let cli = Cli::parse_from(["installation-relay"]);

        // Assert
        assert_eq!(cli.port, DEFAULT_PORT);
        assert_eq!(cli.port, RelayConfig::default().bind_addr.port());
    }

    #[test]
    fn test_cli_port_override() {
        let cli = Cli::parse_from(["installation-relay", "--port", "9999"]);
        assert_eq!(cli.port, 9999);
    }

    #[test]
    fn test_cli_bind_override() {
        let cli = Cli::parse_from(["installation-relay", "--bind", "127.0.0.1"]);
        assert_eq!(cli.bind, "127.0.0.1");
    }

    #[test]
    fn test_cli_on_supersede_close() {
        let cli = Cli::parse_from(["installation-relay", "--on-supersede", "close"]);
        assert_eq!(cli.on_supersede, SupersedePolicy::Close);
    }

    #[test]
    fn test_cli_rejects_unknown_policy() {
        let result = Cli::try_parse_from(["installation-relay", "--on-supersede", "kick"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_non_numeric_port() {
        let result = Cli::try_parse_from(["installation-relay", "--port", "http"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_relay_config_combines_bind_and_port() {
        // Arrange
        let cli = Cli {
            port: 8081,
            bind: "127.0.0.1".to_string(),
            on_supersede: SupersedePolicy::Retain,
        };

        // Act
        let config = cli.into_relay_config().unwrap();

        // Assert
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8081");
    }

    #[test]
    fn test_into_relay_config_accepts_ipv6() {
        let cli = Cli {
            port: 8080,
            bind: "::1".to_string(),
            on_supersede: SupersedePolicy::Close,
        };

        let config = cli.into_relay_config().unwrap();

        assert_eq!(config.bind_addr.to_string(), "[::1]:8080");
        assert_eq!(config.on_supersede, SupersedePolicy::Close);
    }

    #[test]
    fn test_into_relay_config_invalid_bind_returns_error() {
        // Arrange: hostnames are not accepted, only IP literals
        let cli = Cli {
            port: 8080,
            bind: "not.an.ip".to_string(),
            on_supersede: SupersedePolicy::Retain,
        };

        // Act / Assert: must return an error, not panic
        assert!(cli.into_relay_config().is_err());
    }
}
