//! Error type for the relay library.
//!
//! Routing itself never fails: sends to closed peers are skipped and
//! controller messages without an installation are dropped.  These variants
//! cover the edges around it.

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Errors raised by the relay library.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A server notice could not be encoded as JSON.
    #[error("failed to encode server notice: {0}")]
    EncodeNotice(#[from] serde_json::Error),

    /// The hub event loop has stopped and no longer accepts events.
    #[error("relay hub is no longer running")]
    HubClosed,

    /// The WebSocket upgrade handshake with a peer failed.
    #[error("WebSocket handshake failed")]
    Handshake(#[from] WsError),

    /// An established WebSocket session failed mid-stream.
    #[error("WebSocket transport error")]
    Transport(#[source] WsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_closed_message() {
        assert_eq!(
            RelayError::HubClosed.to_string(),
            "relay hub is no longer running"
        );
    }

    #[test]
    fn test_encode_error_converts_from_serde_json() {
        // Arrange: produce a real serde_json error
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

        // Act
        let err: RelayError = json_err.into();

        // Assert
        assert!(matches!(err, RelayError::EncodeNotice(_)));
        assert!(err.to_string().starts_with("failed to encode server notice"));
    }

    #[test]
    fn test_handshake_error_keeps_tungstenite_source() {
        // Arrange
        let err: RelayError = WsError::ConnectionClosed.into();

        // Act
        let source = std::error::Error::source(&err).expect("source must be kept");

        // Assert
        assert!(matches!(err, RelayError::Handshake(_)));
        assert_eq!(source.to_string(), WsError::ConnectionClosed.to_string());
    }

    #[test]
    fn test_transport_error_keeps_tungstenite_source() {
        let err = RelayError::Transport(WsError::AlreadyClosed);

        let source = std::error::Error::source(&err).expect("source must be kept");

        assert_eq!(err.to_string(), "WebSocket transport error");
        assert_eq!(source.to_string(), WsError::AlreadyClosed.to_string());
    }

    #[test]
    fn test_anyhow_chain_includes_tungstenite_cause() {
        // `{:#}` is how session outcomes are logged.
        let err = anyhow::Error::from(RelayError::Transport(WsError::AlreadyClosed));
        let rendered = format!("{err:#}");
        assert!(rendered.contains("WebSocket transport error"));
        assert!(rendered.contains(&WsError::AlreadyClosed.to_string()));
    }
}
