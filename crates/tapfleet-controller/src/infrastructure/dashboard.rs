//! Dashboard WebSocket server: accept loop and per-session tasks.
//!
//! The browser dashboard connects here and exchanges JSON text frames —
//! [`DashboardRequest`] in, [`DashboardReply`] out.  Rendering the page
//! itself is not this process's job; any static file server (or a local
//! `file://` page) can host the HTML, which then opens a WebSocket to
//! this port.
//!
//! Responsibilities:
//!
//! 1. Bind a TCP listener on the configured address.
//! 2. Accept incoming connections and upgrade each to a WebSocket.
//! 3. Run one Tokio task per session: parse each text frame, hand it to
//!    [`StatusApi`], and send the JSON reply back.
//! 4. Shut down cleanly when the shared `running` flag is cleared.
//!
//! One slow or stuck dashboard session never affects the monitors or the
//! other sessions: each session is its own task, and the only shared
//! state is the registry mutex, held for the duration of a snapshot.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};

use crate::application::status_api::StatusApi;

/// Runs the dashboard accept loop until `running` is set to `false`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port
/// is already in use).
pub async fn run_dashboard(
    bind_addr: SocketAddr,
    api: StatusApi,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind dashboard listener on {bind_addr}"))?;

    info!("dashboard listening on {bind_addr}");

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping dashboard accept loop");
            break;
        }

        // Short timeout on accept() so the loop can re-check the running
        // flag even when no browsers are connecting.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                info!("dashboard session from {peer_addr}");
                let api = api.clone();
                tokio::spawn(async move {
                    handle_session(stream, peer_addr, api).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error; keep serving.
                error!("dashboard accept error: {e}");
            }
            Err(_) => {
                // No connection in the last 200 ms; loop to check the flag.
            }
        }
    }

    Ok(())
}

/// Entry point for each per-session task.  Wraps [`run_session`] so the
/// inner function can use `?` while errors get logged in one place.
async fn handle_session(stream: TcpStream, peer_addr: SocketAddr, api: StatusApi) {
    match run_session(stream, api).await {
        Ok(()) => debug!("dashboard session {peer_addr} closed"),
        Err(e) => warn!("dashboard session {peer_addr} ended with error: {e}"),
    }
}

async fn run_session(stream: TcpStream, api: StatusApi) -> anyhow::Result<()> {
    let ws = accept_async(stream)
        .await
        .context("WebSocket handshake failed")?;
    let (mut sink, mut source) = ws.split();

    while let Some(message) = source.next().await {
        let message = match message {
            Ok(m) => m,
            // Browser went away without a close frame; not worth a warning.
            Err(WsError::ConnectionClosed | WsError::Protocol(_)) => break,
            Err(e) => return Err(e.into()),
        };

        match message {
            WsMessage::Text(text) => {
                let reply = api.handle_text(&text).await;
                let json = serde_json::to_string(&reply).context("reply serialization")?;
                sink.send(WsMessage::Text(json)).await?;
            }
            WsMessage::Ping(payload) => {
                sink.send(WsMessage::Pong(payload)).await?;
            }
            WsMessage::Close(_) => break,
            // Binary and pong frames are ignored; the protocol is text-only.
            _ => {}
        }
    }

    Ok(())
}
