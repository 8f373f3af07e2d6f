//! Error types for the store layer.

use gauntlet_protocol::{Lamports, MatchId, ParticipantId};

use crate::{Currency, WalletId};

/// Errors returned by [`Store`](crate::Store) implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    UserNotFound(ParticipantId),

    #[error("no {currency} wallet for user {user}")]
    WalletNotFound {
        user: ParticipantId,
        currency: Currency,
    },

    #[error("wallet {0} not found")]
    UnknownWallet(WalletId),

    /// A debit larger than the current balance. The balance is untouched.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Lamports,
        available: Lamports,
    },

    #[error("balance overflow on wallet {0}")]
    Overflow(WalletId),

    #[error("match {0} already recorded")]
    DuplicateMatch(MatchId),

    /// The backing storage could not be reached or rejected the write.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the error stems from the caller's data rather than from the
    /// storage backend.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound(_) | Self::WalletNotFound { .. } | Self::InsufficientBalance { .. }
        )
    }
}
