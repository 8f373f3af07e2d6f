//! Wire protocol for Gauntlet.
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`FightScript`], ids):
//!   what travels between the browser and the server.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages become
//!   bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! Every frame is a JSON object with a `type` discriminator, e.g.
//! `{"type":"JOIN_QUEUE","payload":{"wagerAmount":100000000}}` inbound and
//! `{"type":"MATCH_FOUND","matchId":"…","wagerAmount":100000000}` outbound.

mod codec;
mod error;
mod script;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use script::{FightEvent, FightEventKind, FightScript, FighterInfo};
pub use types::{
    ClientMessage, Lamports, LobbyPlayer, LobbySnapshot, MatchId, MatchResult,
    ParticipantId, ServerMessage, Side,
};
