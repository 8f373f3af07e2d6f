//! # Gauntlet
//!
//! Realtime wagered PvP arena server. Two participants wager, the server
//! settles the match with a provably fair outcome, pays the winner the full
//! pot and streams a cosmetic fight script to both.
//!
//! The server is generic over two seams supplied by the embedding
//! application: a [`Store`](gauntlet_store::Store) holding users, wallets
//! and match records, and an [`Authenticator`](gauntlet_hub::Authenticator)
//! that turns a connection credential into a participant id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gauntlet::prelude::*;
//!
//! # async fn run() -> Result<(), GauntletError> {
//! let store = Arc::new(MemoryStore::new());
//! let server = GauntletServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(store, TrustingAuthenticator)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_WAGER, ServerConfig};
pub use error::GauntletError;
pub use server::{GauntletServer, GauntletServerBuilder};

pub mod prelude {
    pub use crate::{DEFAULT_WAGER, GauntletError, GauntletServer, GauntletServerBuilder, ServerConfig};
    pub use gauntlet_arena::{MatchmakerConfig, SettlementConfig, SettlementError};
    pub use gauntlet_fairness::{calculate_outcome, hash_server_seed, verify_outcome};
    pub use gauntlet_hub::{Authenticator, HubConfig, HubError, TrustingAuthenticator};
    pub use gauntlet_protocol::{
        ClientMessage, FightScript, Lamports, MatchId, MatchResult, ParticipantId, ServerMessage,
        Side,
    };
    pub use gauntlet_store::{Currency, MemoryStore, Store, StoreError};
}
