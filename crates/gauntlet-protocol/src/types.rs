//! Identity types and the messages exchanged with clients.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{FightScript, ProtocolError};

/// Smallest atomic unit of the wager currency (10⁻⁹ of a display unit).
pub type Lamports = u64;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Verified identity of a participant, as issued by the identity provider.
///
/// Opaque to the core. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of one match, assigned when the pair is formed and reused as
/// the persisted match record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(pub Uuid);

impl MatchId {
    /// Generates a fresh random match id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which half of a pair. Side A is the participant who was waiting in the
/// pending slot; their client seed comes first and their nonce is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    PlayerA,
    PlayerB,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::PlayerA => Self::PlayerB,
            Self::PlayerB => Self::PlayerA,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayerA => f.write_str("playerA"),
            Self::PlayerB => f.write_str("playerB"),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Messages a connected client may send.
///
/// On the wire: `{"type": "JOIN_QUEUE", "payload": {...}}`. The payload is
/// optional for every type; missing fields fall back to server defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "InboundFrame", into = "InboundFrame")]
pub enum ClientMessage {
    /// Join the matchmaking queue. `None` means "use the server default".
    JoinQueue { wager_amount: Option<Lamports> },
    /// Withdraw from the queue if still waiting.
    LeaveQueue,
    Ping,
    /// Enter the shared lobby with an optional cosmetic character.
    LobbyEnter { character: Option<String> },
    /// Move within the lobby. Absent coordinates keep their old value.
    LobbyMove { x: Option<f64>, y: Option<f64> },
}

#[derive(Serialize, Deserialize)]
struct InboundFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<InboundPayload>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wager_amount: Option<Lamports>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<f64>,
}

impl TryFrom<InboundFrame> for ClientMessage {
    type Error = ProtocolError;

    fn try_from(frame: InboundFrame) -> Result<Self, Self::Error> {
        let payload = frame.payload.unwrap_or_default();
        match frame.kind.as_str() {
            "JOIN_QUEUE" => {
                if payload.wager_amount == Some(0) {
                    return Err(ProtocolError::InvalidMessage(
                        "wagerAmount must be positive".into(),
                    ));
                }
                Ok(Self::JoinQueue {
                    wager_amount: payload.wager_amount,
                })
            }
            "LEAVE_QUEUE" => Ok(Self::LeaveQueue),
            "PING" => Ok(Self::Ping),
            "LOBBY_ENTER" => Ok(Self::LobbyEnter {
                character: payload.character,
            }),
            "LOBBY_MOVE" => Ok(Self::LobbyMove {
                x: payload.x,
                y: payload.y,
            }),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown message type: {other}"
            ))),
        }
    }
}

impl From<ClientMessage> for InboundFrame {
    fn from(msg: ClientMessage) -> Self {
        let (kind, payload) = match msg {
            ClientMessage::JoinQueue { wager_amount } => (
                "JOIN_QUEUE",
                Some(InboundPayload {
                    wager_amount,
                    ..InboundPayload::default()
                }),
            ),
            ClientMessage::LeaveQueue => ("LEAVE_QUEUE", None),
            ClientMessage::Ping => ("PING", None),
            ClientMessage::LobbyEnter { character } => (
                "LOBBY_ENTER",
                Some(InboundPayload {
                    character,
                    ..InboundPayload::default()
                }),
            ),
            ClientMessage::LobbyMove { x, y } => (
                "LOBBY_MOVE",
                Some(InboundPayload {
                    x,
                    y,
                    ..InboundPayload::default()
                }),
            ),
        };
        Self {
            kind: kind.to_string(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// One participant's position in a lobby snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub id: ParticipantId,
    pub x: f64,
    pub y: f64,
    pub character: String,
}

/// Presence of everyone currently in the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub players: Vec<LobbyPlayer>,
}

/// Everything a participant needs to audit a settled match.
///
/// `serverSeed` is revealed only here, after settlement; its hash was
/// fixed before the outcome was derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub match_id: MatchId,
    pub winner: Side,
    pub winner_id: ParticipantId,
    pub server_seed: String,
    pub server_seed_hashed: String,
    pub client_seed_a: String,
    pub client_seed_b: String,
    pub nonce: u64,
    pub outcome_hash: String,
    pub event_sequence: FightScript,
    pub wager_amount: Lamports,
    pub total_pot: Lamports,
}

/// Messages the server sends to a client.
///
/// Internally tagged: `{"type": "MATCH_FOUND", "matchId": "…", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    QueueJoined,
    QueueLeft,
    MatchFound {
        match_id: MatchId,
        wager_amount: Lamports,
    },
    MatchResult(MatchResult),
    MatchError {
        error: String,
    },
    LobbySnapshot {
        payload: LobbySnapshot,
    },
    Pong,
    /// The client's last frame was rejected.
    Error {
        error: String,
    },
}
