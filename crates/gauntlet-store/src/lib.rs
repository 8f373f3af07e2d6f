//! The ledger and match-record store that settlement runs against.
//!
//! The core never touches a database directly. It calls the [`Store`]
//! trait, whose operations are each atomic for a single row. The one
//! operation with a cross-call race, "debit if balance is sufficient", is
//! folded into [`Store::adjust_balance`] so implementations can make it a
//! single serialized read-modify-write per wallet.
//!
//! [`MemoryStore`] is the in-process implementation used by the dev server
//! and the test suites.

mod error;
mod memory;
mod records;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use records::{
    Currency, MatchRecord, MatchStatus, Transaction, TransactionId, TransactionKind,
    TransactionStatus, User, Wallet, WalletId,
};

use std::future::Future;

use gauntlet_protocol::{Lamports, MatchId, ParticipantId};

/// Abstract ledger and match store.
///
/// Implementations must be safe to share across tasks: every settlement
/// run holds an `Arc` to the same store.
pub trait Store: Send + Sync + 'static {
    fn find_user(
        &self,
        id: &ParticipantId,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    fn find_wallet(
        &self,
        user: &ParticipantId,
        currency: Currency,
    ) -> impl Future<Output = Result<Wallet, StoreError>> + Send;

    /// Applies `delta` to a wallet's balance and returns the new balance.
    ///
    /// A negative delta larger than the balance fails with
    /// [`StoreError::InsufficientBalance`] and leaves the balance unchanged.
    /// Check and write happen atomically.
    fn adjust_balance(
        &self,
        wallet: WalletId,
        delta: i64,
    ) -> impl Future<Output = Result<Lamports, StoreError>> + Send;

    fn create_match_record(
        &self,
        record: MatchRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn create_transaction(
        &self,
        tx: Transaction,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Advances the user's nonce by one and returns the new value.
    fn increment_nonce(
        &self,
        user: &ParticipantId,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn update_stats(
        &self,
        user: &ParticipantId,
        win_delta: u64,
        loss_delta: u64,
        wagered_delta: Lamports,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn find_match(
        &self,
        id: MatchId,
    ) -> impl Future<Output = Result<Option<MatchRecord>, StoreError>> + Send;

    /// Most recent matches the user took part in, newest first.
    fn match_history(
        &self,
        user: &ParticipantId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<MatchRecord>, StoreError>> + Send;

    /// Most recent completed matches across all users, newest first.
    fn recent_matches(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<MatchRecord>, StoreError>> + Send;

    fn set_client_seed(
        &self,
        user: &ParticipantId,
        seed: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
