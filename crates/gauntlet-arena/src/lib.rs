//! Matchmaking and wagered settlement for Gauntlet.
//!
//! - [`MatchmakerHandle`]: the FIFO queue task that pairs participants and
//!   hands each pair to a [`MatchLauncher`].
//! - [`GameRoom`]: the launcher that locks wagers, derives the provably
//!   fair outcome, records the match and pays the winner.
//! - [`narrate`]: the cosmetic fight script attached to every result.

mod config;
mod error;
mod queue;
mod room;
mod script;

pub use config::{MatchmakerConfig, SettlementConfig};
pub use error::{ArenaError, SettlementError};
pub use queue::{MatchLauncher, MatchPair, MatchmakerHandle, QueueEntry, Seat};
pub use room::GameRoom;
pub use script::{STARTING_HEALTH, narrate, replay};
