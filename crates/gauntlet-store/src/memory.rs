//! In-memory [`Store`] implementation.

use std::collections::HashMap;

use gauntlet_protocol::{Lamports, MatchId, ParticipantId};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    Currency, MatchRecord, MatchStatus, Store, StoreError, Transaction, TransactionKind, User,
    Wallet, WalletId,
};

#[derive(Default)]
struct Tables {
    users: HashMap<ParticipantId, User>,
    wallets: HashMap<WalletId, Wallet>,
    wallet_index: HashMap<(ParticipantId, Currency), WalletId>,
    /// Insertion order doubles as creation order.
    matches: Vec<MatchRecord>,
    transactions: Vec<Transaction>,
}

impl Tables {
    fn user_mut(&mut self, id: &ParticipantId) -> Result<&mut User, StoreError> {
        self.users
            .get_mut(id)
            .ok_or_else(|| StoreError::UserNotFound(id.clone()))
    }
}

/// A [`Store`] held entirely in process memory.
///
/// One lock guards every table, so each operation is trivially atomic and
/// concurrent debits against the same wallet are serialized.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a user, or returns the existing one with that id.
    pub async fn create_user(&self, id: ParticipantId, username: impl Into<String>) -> User {
        let mut tables = self.tables.lock().await;
        tables
            .users
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(user = %id, "user created");
                User::new(id, username)
            })
            .clone()
    }

    /// Credits a user's wallet, creating the wallet on first use, and
    /// records a `DEPOSIT` transaction. Returns the new balance.
    pub async fn deposit(
        &self,
        user: &ParticipantId,
        currency: Currency,
        amount: Lamports,
    ) -> Result<Lamports, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(user) {
            return Err(StoreError::UserNotFound(user.clone()));
        }

        let key = (user.clone(), currency);
        let wallet_id = match tables.wallet_index.get(&key) {
            Some(id) => *id,
            None => {
                let wallet = Wallet {
                    id: WalletId::new(),
                    user_id: user.clone(),
                    currency,
                    balance: 0,
                };
                let id = wallet.id;
                tables.wallets.insert(id, wallet);
                tables.wallet_index.insert(key, id);
                id
            }
        };

        let wallet = tables
            .wallets
            .get_mut(&wallet_id)
            .ok_or(StoreError::UnknownWallet(wallet_id))?;
        wallet.balance = wallet
            .balance
            .checked_add(amount)
            .ok_or(StoreError::Overflow(wallet_id))?;
        let balance = wallet.balance;
        let signed = i64::try_from(amount).map_err(|_| StoreError::Overflow(wallet_id))?;
        let tx = Transaction::completed(wallet, None, TransactionKind::Deposit, signed);
        tables.transactions.push(tx);

        debug!(%user, %currency, amount, balance, "deposit");
        Ok(balance)
    }

    /// Current balance, or `None` if the user has no wallet in `currency`.
    pub async fn balance(&self, user: &ParticipantId, currency: Currency) -> Option<Lamports> {
        let tables = self.tables.lock().await;
        let id = tables.wallet_index.get(&(user.clone(), currency))?;
        tables.wallets.get(id).map(|w| w.balance)
    }

    /// Every ledger entry for the user, oldest first.
    pub async fn transactions(&self, user: &ParticipantId) -> Vec<Transaction> {
        let tables = self.tables.lock().await;
        tables
            .transactions
            .iter()
            .filter(|tx| &tx.user_id == user)
            .cloned()
            .collect()
    }

    pub async fn match_count(&self) -> usize {
        self.tables.lock().await.matches.len()
    }
}

impl Store for MemoryStore {
    async fn find_user(&self, id: &ParticipantId) -> Result<User, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(id.clone()))
    }

    async fn find_wallet(
        &self,
        user: &ParticipantId,
        currency: Currency,
    ) -> Result<Wallet, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .wallet_index
            .get(&(user.clone(), currency))
            .and_then(|id| tables.wallets.get(id))
            .cloned()
            .ok_or_else(|| StoreError::WalletNotFound {
                user: user.clone(),
                currency,
            })
    }

    async fn adjust_balance(&self, wallet: WalletId, delta: i64) -> Result<Lamports, StoreError> {
        let mut tables = self.tables.lock().await;
        let entry = tables
            .wallets
            .get_mut(&wallet)
            .ok_or(StoreError::UnknownWallet(wallet))?;

        let magnitude = delta.unsigned_abs();
        entry.balance = if delta < 0 {
            if entry.balance < magnitude {
                return Err(StoreError::InsufficientBalance {
                    requested: magnitude,
                    available: entry.balance,
                });
            }
            entry.balance - magnitude
        } else {
            entry
                .balance
                .checked_add(magnitude)
                .ok_or(StoreError::Overflow(wallet))?
        };
        Ok(entry.balance)
    }

    async fn create_match_record(&self, record: MatchRecord) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.matches.iter().any(|m| m.id == record.id) {
            return Err(StoreError::DuplicateMatch(record.id));
        }
        tables.matches.push(record);
        Ok(())
    }

    async fn create_transaction(&self, tx: Transaction) -> Result<(), StoreError> {
        self.tables.lock().await.transactions.push(tx);
        Ok(())
    }

    async fn increment_nonce(&self, user: &ParticipantId) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        let user = tables.user_mut(user)?;
        user.nonce += 1;
        Ok(user.nonce)
    }

    async fn update_stats(
        &self,
        user: &ParticipantId,
        win_delta: u64,
        loss_delta: u64,
        wagered_delta: Lamports,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let user = tables.user_mut(user)?;
        user.total_wins += win_delta;
        user.total_losses += loss_delta;
        user.total_wagered = user.total_wagered.saturating_add(wagered_delta);
        Ok(())
    }

    async fn find_match(&self, id: MatchId) -> Result<Option<MatchRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.matches.iter().find(|m| m.id == id).cloned())
    }

    async fn match_history(
        &self,
        user: &ParticipantId,
        limit: usize,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .matches
            .iter()
            .rev()
            .filter(|m| m.involves(user))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent_matches(&self, limit: usize) -> Result<Vec<MatchRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .matches
            .iter()
            .rev()
            .filter(|m| m.status == MatchStatus::Completed)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn set_client_seed(&self, user: &ParticipantId, seed: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        tables.user_mut(user)?.client_seed = seed.to_string();
        Ok(())
    }
}
