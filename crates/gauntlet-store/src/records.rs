//! Persisted domain records.

use std::fmt;
use std::time::SystemTime;

use gauntlet_protocol::{FightScript, Lamports, MatchId, ParticipantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(pub Uuid);

impl WalletId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Sol,
    Ton,
    Usdt,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sol => "SOL",
            Self::Ton => "TON",
            Self::Usdt => "USDT",
        })
    }
}

/// A participant's canonical record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: ParticipantId,
    pub username: String,
    /// Mixed into every outcome this user takes part in.
    pub client_seed: String,
    /// Advances by one per completed match in which this user was side A.
    pub nonce: u64,
    pub total_wins: u64,
    pub total_losses: u64,
    pub total_wagered: Lamports,
}

impl User {
    pub fn new(id: ParticipantId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            client_seed: String::new(),
            nonce: 0,
            total_wins: 0,
            total_losses: 0,
            total_wagered: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: ParticipantId,
    pub currency: Currency,
    pub balance: Lamports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

/// A settled match, created only after both wagers are locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub id: MatchId,
    pub player_a: ParticipantId,
    pub player_b: ParticipantId,
    pub wager_amount: Lamports,
    pub currency: Currency,
    pub server_seed: String,
    pub server_seed_hashed: String,
    pub client_seed_a: String,
    pub client_seed_b: String,
    pub nonce: u64,
    pub winner_id: Option<ParticipantId>,
    pub status: MatchStatus,
    pub fight_script: FightScript,
    pub created_at: SystemTime,
    pub finished_at: Option<SystemTime>,
}

impl MatchRecord {
    pub fn involves(&self, user: &ParticipantId) -> bool {
        &self.player_a == user || &self.player_b == user
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Bet,
    Win,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// A ledger entry. `amount` is signed: credits positive, debits negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: ParticipantId,
    pub wallet_id: WalletId,
    pub match_id: Option<MatchId>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: i64,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub created_at: SystemTime,
}

impl Transaction {
    /// A completed transaction stamped with the current time.
    pub fn completed(
        wallet: &Wallet,
        match_id: Option<MatchId>,
        kind: TransactionKind,
        amount: i64,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            user_id: wallet.user_id.clone(),
            wallet_id: wallet.id,
            match_id,
            kind,
            amount,
            currency: wallet.currency,
            status: TransactionStatus::Completed,
            created_at: SystemTime::now(),
        }
    }
}
