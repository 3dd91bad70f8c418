//! WebSocket server: accept loop and per-session tasks.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections.
//! 3. Upgrading each connection to WebSocket, reading the role marker from
//!    the request URI while the handshake is in progress.
//! 4. Running, per session, a writer task (outbound queue → socket) and a
//!    reader loop (socket → hub events).
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! All routing decisions are made by the hub; sessions only translate
//! transport activity into [`RelayEvent`]s.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        handshake::server::{ErrorResponse, Request, Response},
        Error as WsError, Message as WsMessage,
    },
    WebSocketStream,
};
use tracing::{debug, error, info, warn};

use crate::application::error::RelayError;
use crate::application::peer::{Origin, Peer};
use crate::application::router::{RelayEvent, Router};
use crate::domain::config::{RelayConfig, SupersedePolicy};
use crate::domain::role::Role;
use crate::infrastructure::hub::{spawn_hub, HubHandle};
use crate::infrastructure::ws_peer::{frame_to_payload, WsPeer};

/// How long one `accept()` waits before re-checking the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Upper bound on finishing the close handshake after a peer's Close frame.
const CLOSE_DRAIN: Duration = Duration::from_secs(5);

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr` and serves until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (port in use, missing
/// permission).
pub async fn run_server(config: RelayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {}", config.bind_addr))?;

    info!("relay listening on {}", config.bind_addr);

    serve(listener, config.on_supersede, running).await
}

/// Serves WebSocket sessions on an already-bound listener.
///
/// Split out from [`run_server`] so callers can bind port 0 and learn the
/// real address first.
///
/// # Errors
///
/// Currently always returns `Ok(())` once `running` is cleared; accept errors
/// are logged and the loop continues.
pub async fn serve(
    listener: TcpListener,
    on_supersede: SupersedePolicy,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let (hub, _hub_task) = spawn_hub(Router::<WsPeer>::new(on_supersede));

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                debug!("new TCP connection from {peer_addr}");
                let hub = hub.clone();
                tokio::spawn(async move {
                    handle_connection(stream, peer_addr, hub).await;
                });
            }
            Ok(Err(e)) => {
                // e.g. too many open file descriptors; keep serving.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout; loop back to check `running`.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Runs one session and logs how it ended.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, hub: HubHandle<WsPeer>) {
    match run_session(stream, peer_addr, hub).await {
        Ok(()) => info!("session {peer_addr} closed"),
        Err(e) => warn!("session {peer_addr} ended with error: {e:#}"),
    }
}

/// Full lifecycle of one WebSocket session.
///
/// Raises exactly one `Connected` and, once the handshake succeeded, exactly
/// one `Closed` event, with any `Message`/`Failed` events in between.
async fn run_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    hub: HubHandle<WsPeer>,
) -> anyhow::Result<()> {
    // ── Step 1: handshake, capturing the query string ──────────────────────────
    let mut query: Option<String> = None;
    let ws_stream = accept_hdr_async(
        stream,
        |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            query = request.uri().query().map(str::to_owned);
            Ok(response)
        },
    )
    .await
    .map_err(RelayError::from)
    .with_context(|| format!("session {peer_addr}"))?;

    let role = Role::from_query(query.as_deref());

    // ── Step 2: outbound queue + writer task ───────────────────────────────────
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsMessage>();
    let peer = WsPeer::new(out_tx);
    let origin = Origin::new(peer.id(), role);

    info!("WebSocket session established: {peer_addr} as {role} ({})", origin.id);

    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let closing = matches!(frame, WsMessage::Close(_));
            if let Err(e) = ws_tx.send(frame).await {
                debug!("session {}: WebSocket send failed: {e}", origin.id);
                break;
            }
            if closing {
                break;
            }
        }
    });

    // ── Step 3: register, then pump inbound frames into the hub ────────────────
    hub.dispatch(RelayEvent::Connected {
        role,
        peer: peer.clone(),
    })?;

    let read_result = read_frames(&mut ws_rx, origin, &hub).await;

    // ── Step 4: teardown ───────────────────────────────────────────────────────
    peer.mark_closed();
    writer.abort();
    hub.dispatch(RelayEvent::Closed { origin })?;

    Ok(read_result?)
}

/// Forwards data frames from the socket to the hub until the session ends.
///
/// Transport errors are reported as `Failed` events and then returned, so the
/// session outcome is logged at `warn`.  The caller raises the matching
/// `Closed`.
async fn read_frames(
    ws_rx: &mut SplitStream<WebSocketStream<TcpStream>>,
    origin: Origin,
    hub: &HubHandle<WsPeer>,
) -> Result<(), RelayError> {
    loop {
        let frame = match ws_rx.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                debug!("session {}: stream ended", origin.id);
                return Ok(());
            }
            Some(Err(e)) => {
                hub.dispatch(RelayEvent::Failed {
                    origin,
                    error: e.to_string(),
                })?;
                return Err(RelayError::Transport(e));
            }
        };

        if let WsMessage::Close(_) = frame {
            debug!("session {}: Close frame received", origin.id);
            finish_close_handshake(ws_rx, origin).await;
            return Ok(());
        }

        match frame_to_payload(frame) {
            Some(payload) => hub.dispatch(RelayEvent::Message { origin, payload })?,
            None => debug!("session {}: control frame (not routed)", origin.id),
        }
    }
}

/// Keeps reading after the peer's Close frame so tungstenite flushes its
/// queued Close reply, until the stream ends or [`CLOSE_DRAIN`] elapses.
async fn finish_close_handshake(
    ws_rx: &mut SplitStream<WebSocketStream<TcpStream>>,
    origin: Origin,
) {
    let drained = timeout(CLOSE_DRAIN, async {
        while let Some(item) = ws_rx.next().await {
            match item {
                Ok(frame) => debug!("session {}: frame after Close ignored: {frame:?}", origin.id),
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
                Err(e) => {
                    debug!("session {}: error while closing: {e}", origin.id);
                    break;
                }
            }
        }
    })
    .await;

    if drained.is_err() {
        debug!("session {}: close handshake timed out", origin.id);
    }
}
