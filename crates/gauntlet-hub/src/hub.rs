//! The hub actor: sole owner of the live connection set.
//!
//! Every mutation (register, unregister, presence updates) and every
//! iteration (broadcasts, lobby snapshots) runs inside one Tokio task fed
//! by a command channel, so the set is never read while being modified.
//! Outbound frames go into a bounded per-connection channel; a connection
//! whose channel is full is treated as unresponsive and dropped rather
//! than allowed to stall the hub.

use std::collections::BTreeMap;

use gauntlet_protocol::{
    Codec, JsonCodec, LobbyPlayer, LobbySnapshot, ParticipantId, ServerMessage,
};
use gauntlet_tick::Ticker;
use gauntlet_transport::ConnectionId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{HubConfig, HubError};

/// Where a participant lands when entering the lobby.
pub const LOBBY_SPAWN: (f64, f64) = (400.0, 300.0);
/// Cosmetic used when `LOBBY_ENTER` names none.
pub const DEFAULT_CHARACTER: &str = "fighter";

/// Receiving end of a connection's outbound queue. The connection's writer
/// task drains it; `None` from `recv` means the hub dropped the connection.
pub type OutboundReceiver = mpsc::Receiver<Vec<u8>>;

enum HubCommand {
    Register {
        conn: ConnectionId,
        participant: ParticipantId,
        reply: oneshot::Sender<Result<OutboundReceiver, HubError>>,
    },
    Unregister {
        conn: ConnectionId,
    },
    Broadcast {
        frame: Vec<u8>,
    },
    Deliver {
        conn: ConnectionId,
        frame: Vec<u8>,
    },
    EnterLobby {
        conn: ConnectionId,
        character: Option<String>,
    },
    MoveInLobby {
        conn: ConnectionId,
        x: Option<f64>,
        y: Option<f64>,
    },
    IsConnected {
        conn: ConnectionId,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub connections: usize,
    pub in_lobby: usize,
}

/// Cloneable handle to the hub task.
///
/// The hub stops once every handle has been dropped.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
    codec: JsonCodec,
}

impl HubHandle {
    /// Spawns the hub task.
    pub fn spawn(config: HubConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.command_buffer.max(1));
        let actor = Hub {
            ticker: Ticker::with_rate(config.snapshot_rate_hz),
            outbound_buffer: config.outbound_buffer.max(1),
            connections: BTreeMap::new(),
            commands: rx,
            codec: JsonCodec,
        };
        tokio::spawn(actor.run());
        Self {
            commands: tx,
            codec: JsonCodec,
        }
    }

    /// Adds a connection and returns the queue its writer should drain.
    ///
    /// Several connections may share a participant id.
    pub async fn register(
        &self,
        conn: ConnectionId,
        participant: ParticipantId,
    ) -> Result<OutboundReceiver, HubError> {
        let (reply, rx) = oneshot::channel();
        self.command(HubCommand::Register {
            conn,
            participant,
            reply,
        })
        .await?;
        rx.await.map_err(|_| HubError::Unavailable)?
    }

    /// Removes a connection and closes its outbound queue. A no-op if it is
    /// already gone.
    pub async fn unregister(&self, conn: ConnectionId) -> Result<(), HubError> {
        self.command(HubCommand::Unregister { conn }).await
    }

    /// Queues `msg` for every registered connection.
    pub async fn broadcast(&self, msg: &ServerMessage) -> Result<(), HubError> {
        let frame = self.codec.encode(msg)?;
        self.command(HubCommand::Broadcast { frame }).await
    }

    /// Queues `msg` for one connection. Dropped silently if the connection
    /// has already gone.
    pub async fn send(&self, conn: ConnectionId, msg: &ServerMessage) -> Result<(), HubError> {
        let frame = self.codec.encode(msg)?;
        self.command(HubCommand::Deliver { conn, frame }).await
    }

    pub async fn enter_lobby(
        &self,
        conn: ConnectionId,
        character: Option<String>,
    ) -> Result<(), HubError> {
        self.command(HubCommand::EnterLobby { conn, character }).await
    }

    /// Updates whichever coordinates are given.
    pub async fn move_in_lobby(
        &self,
        conn: ConnectionId,
        x: Option<f64>,
        y: Option<f64>,
    ) -> Result<(), HubError> {
        self.command(HubCommand::MoveInLobby { conn, x, y }).await
    }

    /// Whether `conn` is still registered. A stopped hub reports `false`.
    pub async fn is_connected(&self, conn: ConnectionId) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .command(HubCommand::IsConnected { conn, reply })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.command(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| HubError::Unavailable)
    }

    async fn command(&self, cmd: HubCommand) -> Result<(), HubError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| HubError::Unavailable)
    }
}

struct Entry {
    participant: ParticipantId,
    outbound: mpsc::Sender<Vec<u8>>,
    in_lobby: bool,
    x: f64,
    y: f64,
    character: String,
}

struct Hub {
    ticker: Ticker,
    outbound_buffer: usize,
    /// Ordered so snapshots list players deterministically.
    connections: BTreeMap<ConnectionId, Entry>,
    commands: mpsc::Receiver<HubCommand>,
    codec: JsonCodec,
}

impl Hub {
    async fn run(mut self) {
        info!("hub started");
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                _ = self.ticker.wait_for_tick() => self.broadcast_snapshot(),
            }
        }
        info!(connections = self.connections.len(), "hub stopped");
    }

    fn handle(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Register {
                conn,
                participant,
                reply,
            } => {
                let _ = reply.send(self.register(conn, participant));
            }
            HubCommand::Unregister { conn } => {
                self.unregister(conn);
            }
            HubCommand::Broadcast { frame } => {
                let targets: Vec<ConnectionId> = self.connections.keys().copied().collect();
                self.deliver_all(&targets, &frame);
            }
            HubCommand::Deliver { conn, frame } => {
                self.deliver_all(&[conn], &frame);
            }
            HubCommand::EnterLobby { conn, character } => {
                if let Some(entry) = self.connections.get_mut(&conn) {
                    entry.in_lobby = true;
                    (entry.x, entry.y) = LOBBY_SPAWN;
                    entry.character = character.unwrap_or_else(|| DEFAULT_CHARACTER.to_string());
                    debug!(%conn, participant = %entry.participant, character = %entry.character, "entered lobby");
                }
            }
            HubCommand::MoveInLobby { conn, x, y } => {
                if let Some(entry) = self.connections.get_mut(&conn) {
                    if let Some(x) = x {
                        entry.x = x;
                    }
                    if let Some(y) = y {
                        entry.y = y;
                    }
                }
            }
            HubCommand::IsConnected { conn, reply } => {
                let _ = reply.send(self.connections.contains_key(&conn));
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(HubStats {
                    connections: self.connections.len(),
                    in_lobby: self.connections.values().filter(|e| e.in_lobby).count(),
                });
            }
        }
    }

    fn register(
        &mut self,
        conn: ConnectionId,
        participant: ParticipantId,
    ) -> Result<OutboundReceiver, HubError> {
        if self.connections.contains_key(&conn) {
            return Err(HubError::AlreadyRegistered(conn));
        }
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        info!(%conn, %participant, total = self.connections.len() + 1, "connection registered");
        self.connections.insert(
            conn,
            Entry {
                participant,
                outbound: tx,
                in_lobby: false,
                x: 0.0,
                y: 0.0,
                character: DEFAULT_CHARACTER.to_string(),
            },
        );
        Ok(rx)
    }

    /// Dropping the entry drops the only sender, which closes the queue.
    fn unregister(&mut self, conn: ConnectionId) {
        if let Some(entry) = self.connections.remove(&conn) {
            info!(%conn, participant = %entry.participant, total = self.connections.len(), "connection unregistered");
        }
    }

    fn deliver_all(&mut self, targets: &[ConnectionId], frame: &[u8]) {
        let mut dead = Vec::new();
        for conn in targets {
            let Some(entry) = self.connections.get(conn) else {
                continue;
            };
            match entry.outbound.try_send(frame.to_vec()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(%conn, participant = %entry.participant, "outbound buffer full, dropping connection");
                    dead.push(*conn);
                }
                Err(TrySendError::Closed(_)) => dead.push(*conn),
            }
        }
        for conn in dead {
            self.unregister(conn);
        }
    }

    fn broadcast_snapshot(&mut self) {
        let (targets, players): (Vec<ConnectionId>, Vec<LobbyPlayer>) = self
            .connections
            .iter()
            .filter(|(_, e)| e.in_lobby)
            .map(|(conn, e)| {
                (
                    *conn,
                    LobbyPlayer {
                        id: e.participant.clone(),
                        x: e.x,
                        y: e.y,
                        character: e.character.clone(),
                    },
                )
            })
            .unzip();

        if players.is_empty() {
            return;
        }

        let msg = ServerMessage::LobbySnapshot {
            payload: LobbySnapshot { players },
        };
        match self.codec.encode(&msg) {
            Ok(frame) => self.deliver_all(&targets, &frame),
            Err(e) => warn!(error = %e, "failed to encode lobby snapshot"),
        }
    }
}
