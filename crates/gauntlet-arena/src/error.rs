//! Error types for matchmaking and settlement.

use gauntlet_fairness::FairnessError;
use gauntlet_hub::HubError;
use gauntlet_protocol::{Lamports, MatchId, Side};
use gauntlet_store::StoreError;

/// Errors from the matchmaking queue.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The matchmaker task has stopped.
    #[error("matchmaker is unavailable")]
    Unavailable,

    #[error(transparent)]
    Hub(#[from] HubError),
}

/// Why a settlement run ended without a result.
///
/// Every variant is raised only after all wager locks taken by the run
/// have been refunded, except [`SettlementError::Payout`], which happens
/// after the match was recorded.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("failed to load {side}: {source}")]
    ParticipantLookup {
        side: Side,
        #[source]
        source: StoreError,
    },

    #[error("wager of {0} lamports is too large to settle")]
    WagerTooLarge(Lamports),

    #[error("{side} has insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        side: Side,
        requested: Lamports,
        available: Lamports,
    },

    #[error("failed to lock wager for {side}: {source}")]
    Ledger {
        side: Side,
        #[source]
        source: StoreError,
    },

    #[error("server seed generation failed: {0}")]
    Entropy(#[from] FairnessError),

    #[error("failed to persist match record: {0}")]
    Persistence(#[source] StoreError),

    #[error("payout for match {match_id} failed: {source}")]
    Payout {
        match_id: MatchId,
        #[source]
        source: StoreError,
    },
}

impl SettlementError {
    /// `true` for problems with the participants' own data (unknown user,
    /// not enough funds), `false` for infrastructure faults.
    pub fn is_user_recoverable(&self) -> bool {
        match self {
            Self::ParticipantLookup { source, .. } => source.is_user_recoverable(),
            Self::WagerTooLarge(_) | Self::InsufficientBalance { .. } => true,
            Self::Ledger { .. } | Self::Entropy(_) | Self::Persistence(_) | Self::Payout { .. } => {
                false
            }
        }
    }

    /// Text sent to both participants in `MATCH_ERROR`.
    pub fn public_message(&self) -> String {
        match self {
            Self::ParticipantLookup { side, .. } => format!("Failed to find {}", label(*side)),
            Self::InsufficientBalance { side, .. } => {
                format!("{} has insufficient balance", label(*side))
            }
            Self::WagerTooLarge(_) => "Wager amount is too large".to_string(),
            Self::Ledger { side, .. } => format!("Failed to lock wager for {}", label(*side)),
            Self::Entropy(_) => "Failed to generate server seed".to_string(),
            Self::Persistence(_) => "Failed to record match".to_string(),
            Self::Payout { .. } => "Failed to pay out winnings".to_string(),
        }
    }
}

fn label(side: Side) -> &'static str {
    match side {
        Side::PlayerA => "Player A",
        Side::PlayerB => "Player B",
    }
}
