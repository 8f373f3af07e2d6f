//! The matchmaking queue.
//!
//! One task drains join requests strictly in arrival order and holds at
//! most one waiting entry. Pairing that entry with the next arrival is the
//! single transition that launches a match, so an entry can never be paired
//! twice.

use gauntlet_hub::HubHandle;
use gauntlet_protocol::{Lamports, MatchId, ParticipantId, ServerMessage};
use gauntlet_transport::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{ArenaError, MatchmakerConfig};

/// A participant waiting for an opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub conn: ConnectionId,
    pub participant: ParticipantId,
    pub wager: Lamports,
}

/// One side of a formed pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub conn: ConnectionId,
    pub participant: ParticipantId,
}

impl From<QueueEntry> for Seat {
    fn from(entry: QueueEntry) -> Self {
        Self {
            conn: entry.conn,
            participant: entry.participant,
        }
    }
}

/// A bound pair, ready for settlement. Side A is the entry that was
/// waiting; side B is the arrival that completed the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPair {
    pub match_id: MatchId,
    pub player_a: Seat,
    pub player_b: Seat,
    /// The smaller of the two requested wagers.
    pub wager: Lamports,
}

/// Starts a match for a freshly formed pair.
///
/// Called from the queue task, so implementations must hand the work off
/// (typically with `tokio::spawn`) instead of running it inline.
pub trait MatchLauncher: Send + Sync + 'static {
    fn launch(&self, pair: MatchPair);
}

enum QueueCommand {
    Join(QueueEntry),
    Leave(ConnectionId),
}

/// Cloneable handle to the matchmaking task.
#[derive(Clone)]
pub struct MatchmakerHandle {
    commands: mpsc::Sender<QueueCommand>,
}

impl MatchmakerHandle {
    /// Spawns the queue task. Acknowledgements and `MATCH_FOUND` notices
    /// are delivered through `hub`; formed pairs go to `launcher`.
    pub fn spawn<L: MatchLauncher>(config: MatchmakerConfig, hub: HubHandle, launcher: L) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let queue = Matchmaker {
            hub,
            launcher,
            pending: None,
            commands: rx,
        };
        tokio::spawn(queue.run());
        Self { commands: tx }
    }

    /// Adds an entry to the queue. The participant receives `QUEUE_JOINED`
    /// once the queue has taken the entry.
    pub async fn enqueue(&self, entry: QueueEntry) -> Result<(), ArenaError> {
        self.commands
            .send(QueueCommand::Join(entry))
            .await
            .map_err(|_| ArenaError::Unavailable)
    }

    /// Withdraws the connection if it is the waiting entry, then answers
    /// `QUEUE_LEFT`.
    pub async fn leave(&self, conn: ConnectionId) -> Result<(), ArenaError> {
        self.commands
            .send(QueueCommand::Leave(conn))
            .await
            .map_err(|_| ArenaError::Unavailable)
    }
}

struct Matchmaker<L> {
    hub: HubHandle,
    launcher: L,
    pending: Option<QueueEntry>,
    commands: mpsc::Receiver<QueueCommand>,
}

impl<L: MatchLauncher> Matchmaker<L> {
    async fn run(mut self) {
        info!("matchmaker started");
        while let Some(cmd) = self.commands.recv().await {
            match cmd {
                QueueCommand::Join(entry) => {
                    self.notify(entry.conn, &ServerMessage::QueueJoined).await;
                    self.offer(entry).await;
                }
                QueueCommand::Leave(conn) => {
                    if self.pending.as_ref().is_some_and(|p| p.conn == conn) {
                        let left = self.pending.take();
                        debug!(%conn, participant = ?left.map(|e| e.participant), "left queue");
                    }
                    self.notify(conn, &ServerMessage::QueueLeft).await;
                }
            }
        }
        info!("matchmaker stopped");
    }

    async fn offer(&mut self, entry: QueueEntry) {
        let Some(pending) = self.pending.take() else {
            debug!(conn = %entry.conn, participant = %entry.participant, wager = entry.wager, "waiting for opponent");
            self.pending = Some(entry);
            return;
        };

        if pending.conn == entry.conn {
            debug!(conn = %entry.conn, "duplicate join from waiting connection ignored");
            self.pending = Some(pending);
            return;
        }

        if !self.hub.is_connected(pending.conn).await {
            debug!(stale = %pending.conn, replacement = %entry.conn, "waiting connection gone, replacing");
            self.pending = Some(entry);
            return;
        }

        let pair = MatchPair {
            match_id: MatchId::new(),
            wager: pending.wager.min(entry.wager),
            player_a: pending.into(),
            player_b: entry.into(),
        };
        info!(
            match_id = %pair.match_id,
            player_a = %pair.player_a.participant,
            player_b = %pair.player_b.participant,
            wager = pair.wager,
            "match found"
        );

        let found = ServerMessage::MatchFound {
            match_id: pair.match_id,
            wager_amount: pair.wager,
        };
        self.notify(pair.player_a.conn, &found).await;
        self.notify(pair.player_b.conn, &found).await;

        self.launcher.launch(pair);
    }

    async fn notify(&self, conn: ConnectionId, msg: &ServerMessage) {
        if let Err(e) = self.hub.send(conn, msg).await {
            warn!(%conn, error = %e, "failed to deliver queue notice");
        }
    }
}
