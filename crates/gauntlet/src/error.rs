//! Unified error type for the Gauntlet server.

use gauntlet_arena::{ArenaError, SettlementError};
use gauntlet_fairness::FairnessError;
use gauntlet_hub::HubError;
use gauntlet_protocol::ProtocolError;
use gauntlet_store::StoreError;
use gauntlet_transport::TransportError;

/// Top-level error that wraps every crate-specific error, so `?` works
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum GauntletError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fairness(#[from] FairnessError),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
