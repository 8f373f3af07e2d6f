//! Per-connection handler: authentication, registration and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Authenticate the credential captured at upgrade time
//!   2. Register with the hub and start a writer task that drains the
//!      connection's outbound queue and pings the peer
//!   3. Loop: receive frames, decode, dispatch to the hub or matchmaker,
//!      until the peer closes or stays silent past the read timeout
//!
//! All replies go through the hub so that a connection's outbound frames
//! keep a single order no matter which task produced them.

use std::sync::Arc;
use std::time::Duration;

use gauntlet_arena::QueueEntry;
use gauntlet_hub::{Authenticator, HubHandle, OutboundReceiver};
use gauntlet_protocol::{ClientMessage, Codec, ParticipantId, ProtocolError, ServerMessage};
use gauntlet_transport::{Connection, ConnectionId, TransportError, WebSocketConnection};

use crate::GauntletError;
use crate::server::ServerState;

/// Unregisters the connection when the handler exits, including on panic.
///
/// `Drop` is synchronous, so the unregister is fire-and-forget.
struct RegistrationGuard {
    conn_id: ConnectionId,
    hub: HubHandle,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let hub = self.hub.clone();
        tokio::spawn(async move {
            let _ = hub.unregister(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A: Authenticator>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A>>,
) -> Result<(), GauntletError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Authenticate ---
    let credential = conn.credential().unwrap_or_default().to_string();
    let participant = match state.auth.authenticate(&credential).await {
        Ok(participant) => participant,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "authentication failed");
            let frame = state.codec.encode(&ServerMessage::Error {
                error: "Authentication failed".into(),
            })?;
            let _ = conn.send(&frame).await;
            let _ = conn.close().await;
            return Err(e.into());
        }
    };

    // --- Step 2: Register and start the writer ---
    let outbound = state.hub.register(conn_id, participant.clone()).await?;
    let _guard = RegistrationGuard {
        conn_id,
        hub: state.hub.clone(),
    };
    tracing::info!(%conn_id, %participant, "participant connected");

    let conn = Arc::new(conn);
    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        outbound,
        state.config.ping_interval(),
    ));

    // --- Step 3: Message loop ---
    let result = read_loop(&conn, &state, &participant).await;

    writer.abort();
    tracing::info!(%conn_id, %participant, "participant disconnected");
    // _guard drops here → hub unregister fires.
    result
}

/// Forwards queued frames to the socket and pings the peer every
/// `ping_interval`. Ends when the hub drops the queue (unregister) or the
/// socket fails.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut outbound: OutboundReceiver,
    ping_interval: Duration,
) {
    let mut keepalive =
        tokio::time::interval_at(tokio::time::Instant::now() + ping_interval, ping_interval);
    keepalive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let sent = tokio::select! {
            frame = outbound.recv() => match frame {
                Some(frame) => conn.send(&frame).await,
                None => break,
            },
            _ = keepalive.tick() => conn.ping().await,
        };
        if let Err(e) = sent {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed");
            break;
        }
    }
    let _ = conn.close().await;
}

/// Waits for the next frame. Gives up with `None` once the peer has been
/// silent for `idle_limit`; pongs count as traffic.
async fn recv_until_idle(
    conn: &WebSocketConnection,
    idle_limit: Duration,
) -> Option<Result<Option<Vec<u8>>, TransportError>> {
    loop {
        let remaining = idle_limit.saturating_sub(conn.idle_for());
        if remaining.is_zero() {
            return None;
        }
        if let Ok(result) = tokio::time::timeout(remaining, conn.recv()).await {
            return Some(result);
        }
    }
}

async fn read_loop<A: Authenticator>(
    conn: &WebSocketConnection,
    state: &ServerState<A>,
    participant: &ParticipantId,
) -> Result<(), GauntletError> {
    let conn_id = conn.id();
    loop {
        let data = match recv_until_idle(conn, state.config.read_timeout).await {
            Some(Ok(Some(data))) => data,
            Some(Ok(None)) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Some(Err(e)) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Ok(());
            }
            None => {
                tracing::info!(%conn_id, "connection timed out");
                return Ok(());
            }
        };

        let msg = match decode(state, &data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "rejected inbound frame");
                state
                    .hub
                    .send(conn_id, &ServerMessage::Error { error: e.to_string() })
                    .await?;
                continue;
            }
        };

        dispatch(state, conn_id, participant, msg).await?;
    }
}

fn decode<A: Authenticator>(
    state: &ServerState<A>,
    data: &[u8],
) -> Result<ClientMessage, ProtocolError> {
    let max = state.config.max_frame_bytes;
    if data.len() > max {
        return Err(ProtocolError::FrameTooLarge {
            size: data.len(),
            max,
        });
    }
    state.codec.decode(data)
}

async fn dispatch<A: Authenticator>(
    state: &ServerState<A>,
    conn_id: ConnectionId,
    participant: &ParticipantId,
    msg: ClientMessage,
) -> Result<(), GauntletError> {
    match msg {
        ClientMessage::JoinQueue { wager_amount } => {
            let wager = wager_amount.unwrap_or(state.config.default_wager);
            tracing::debug!(%conn_id, %participant, wager, "join queue");
            state
                .matchmaker
                .enqueue(QueueEntry {
                    conn: conn_id,
                    participant: participant.clone(),
                    wager,
                })
                .await?;
        }
        ClientMessage::LeaveQueue => {
            state.matchmaker.leave(conn_id).await?;
        }
        ClientMessage::Ping => {
            state.hub.send(conn_id, &ServerMessage::Pong).await?;
        }
        ClientMessage::LobbyEnter { character } => {
            state.hub.enter_lobby(conn_id, character).await?;
        }
        ClientMessage::LobbyMove { x, y } => {
            state.hub.move_in_lobby(conn_id, x, y).await?;
        }
    }
    Ok(())
}
