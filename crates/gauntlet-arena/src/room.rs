//! The game room: settles one wagered match end to end.
//!
//! A run locks both wagers, derives the outcome, records the match, pays
//! the winner and tells both participants. Steps run strictly in order.
//! Until the match record exists, every failure refunds whatever was
//! locked before returning. Once it exists the locks are committed and the
//! remaining bookkeeping is best effort.

use std::sync::Arc;
use std::time::SystemTime;

use gauntlet_fairness::{OsSeedSource, SeedSource, Winner, calculate_outcome, hash_server_seed};
use gauntlet_hub::{DEFAULT_CHARACTER, HubHandle};
use gauntlet_protocol::{FighterInfo, Lamports, MatchResult, ServerMessage, Side};
use gauntlet_store::{
    MatchRecord, MatchStatus, Store, StoreError, Transaction, TransactionKind, User, Wallet,
};
use tracing::{error, info, warn};

use crate::queue::{MatchLauncher, MatchPair};
use crate::script::narrate;
use crate::{SettlementConfig, SettlementError};

const DEFAULT_SKIN: &str = "default";

/// Funds debited from one wallet for the duration of a run.
#[must_use = "a wager lock must be committed or refunded"]
struct WagerLock {
    wallet: Wallet,
    amount: Lamports,
    /// `amount` as a ledger delta.
    delta: i64,
    resolved: bool,
}

impl WagerLock {
    /// Debits `amount` if and only if the wallet holds at least that much.
    async fn acquire<S: Store>(
        store: &S,
        wallet: Wallet,
        amount: Lamports,
    ) -> Result<Self, StoreError> {
        let delta = i64::try_from(amount).map_err(|_| StoreError::Overflow(wallet.id))?;
        store.adjust_balance(wallet.id, -delta).await?;
        Ok(Self {
            wallet,
            amount,
            delta,
            resolved: false,
        })
    }

    /// The wager is now part of a recorded match.
    fn commit(mut self) -> Wallet {
        self.resolved = true;
        self.wallet.clone()
    }

    /// Returns the funds. A failed refund cannot be recovered here, so it
    /// is logged with everything needed to repair it by hand.
    async fn refund<S: Store>(mut self, store: &S) {
        self.resolved = true;
        if let Err(e) = store.adjust_balance(self.wallet.id, self.delta).await {
            error!(
                wallet = %self.wallet.id,
                user = %self.wallet.user_id,
                amount = self.amount,
                error = %e,
                "wager refund failed"
            );
        }
    }
}

impl Drop for WagerLock {
    fn drop(&mut self) {
        if !self.resolved {
            error!(
                wallet = %self.wallet.id,
                user = %self.wallet.user_id,
                amount = self.amount,
                "wager lock dropped unresolved"
            );
        }
    }
}

/// Settles matches against a [`Store`], delivering results through the hub.
pub struct GameRoom<S, E = OsSeedSource> {
    store: Arc<S>,
    seeds: Arc<E>,
    hub: HubHandle,
    config: SettlementConfig,
}

impl<S, E> Clone for GameRoom<S, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            seeds: Arc::clone(&self.seeds),
            hub: self.hub.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: Store> GameRoom<S> {
    pub fn new(store: Arc<S>, hub: HubHandle, config: SettlementConfig) -> Self {
        Self::with_seed_source(store, Arc::new(OsSeedSource), hub, config)
    }
}

impl<S: Store, E: SeedSource> GameRoom<S, E> {
    pub fn with_seed_source(
        store: Arc<S>,
        seeds: Arc<E>,
        hub: HubHandle,
        config: SettlementConfig,
    ) -> Self {
        Self {
            store,
            seeds,
            hub,
            config,
        }
    }

    /// Runs one settlement. On failure both participants receive
    /// `MATCH_ERROR`; on success both receive `MATCH_RESULT`.
    pub async fn settle(&self, pair: MatchPair) -> Result<MatchResult, SettlementError> {
        match self.run(&pair).await {
            Ok(result) => {
                let msg = ServerMessage::MatchResult(result.clone());
                self.notify(&pair, &msg).await;
                info!(
                    match_id = %pair.match_id,
                    winner = %result.winner_id,
                    pot = result.total_pot,
                    "match settled"
                );
                Ok(result)
            }
            Err(e) => {
                let msg = ServerMessage::MatchError {
                    error: e.public_message(),
                };
                self.notify(&pair, &msg).await;
                Err(e)
            }
        }
    }

    async fn run(&self, pair: &MatchPair) -> Result<MatchResult, SettlementError> {
        let store = self.store.as_ref();
        let wager = pair.wager;

        // 1. Canonical records.
        let user_a = self.find_user(pair, Side::PlayerA).await?;
        let user_b = self.find_user(pair, Side::PlayerB).await?;

        // The pot must be payable as a single ledger delta before anything
        // is locked.
        let Some((total_pot, pot_delta)) = wager
            .checked_mul(2)
            .and_then(|pot| Some((pot, i64::try_from(pot).ok()?)))
        else {
            return Err(SettlementError::WagerTooLarge(wager));
        };

        // 2-3. Lock both wagers; B failing releases A.
        let lock_a = self.lock(&user_a, Side::PlayerA, wager).await?;
        let lock_b = match self.lock(&user_b, Side::PlayerB, wager).await {
            Ok(lock) => lock,
            Err(e) => {
                lock_a.refund(store).await;
                return Err(e);
            }
        };

        // 4. Fresh server seed.
        let server_seed = match self.seeds.generate() {
            Ok(seed) => seed,
            Err(e) => {
                lock_a.refund(store).await;
                lock_b.refund(store).await;
                return Err(e.into());
            }
        };
        let server_seed_hashed = hash_server_seed(&server_seed);

        // 5. Outcome from both client seeds and A's nonce.
        let combined_seed = format!("{}-{}", user_a.client_seed, user_b.client_seed);
        let nonce = user_a.nonce;
        let outcome = calculate_outcome(&server_seed, &combined_seed, nonce);
        let (winner, winner_user, loser_user) = match outcome.winner {
            Winner::SideA => (Side::PlayerA, &user_a, &user_b),
            Winner::SideB => (Side::PlayerB, &user_b, &user_a),
        };

        // 6. Narration. The rng is not Send, so it must not live across an await.
        let script = {
            let mut rng = rand::rng();
            narrate(
                pair.match_id,
                fighter(&user_a),
                fighter(&user_b),
                winner,
                &mut rng,
            )
        };

        // 7. Persist.
        let now = SystemTime::now();
        let record = MatchRecord {
            id: pair.match_id,
            player_a: user_a.id.clone(),
            player_b: user_b.id.clone(),
            wager_amount: wager,
            currency: self.config.currency,
            server_seed: server_seed.clone(),
            server_seed_hashed: server_seed_hashed.clone(),
            client_seed_a: user_a.client_seed.clone(),
            client_seed_b: user_b.client_seed.clone(),
            nonce,
            winner_id: Some(winner_user.id.clone()),
            status: MatchStatus::Completed,
            fight_script: script.clone(),
            created_at: now,
            finished_at: Some(now),
        };
        if let Err(e) = store.create_match_record(record).await {
            lock_a.refund(store).await;
            lock_b.refund(store).await;
            error!(match_id = %pair.match_id, error = %e, "match record not persisted, wagers refunded");
            return Err(SettlementError::Persistence(e));
        }

        let wallet_a = lock_a.commit();
        let wallet_b = lock_b.commit();
        let winner_wallet = match winner {
            Side::PlayerA => &wallet_a,
            Side::PlayerB => &wallet_b,
        };

        // 8. Pay the full pot.
        if let Err(e) = store.adjust_balance(winner_wallet.id, pot_delta).await {
            error!(
                match_id = %pair.match_id,
                winner = %winner_user.id,
                wallet = %winner_wallet.id,
                pot = total_pot,
                error = %e,
                "payout failed after match was recorded"
            );
            return Err(SettlementError::Payout {
                match_id: pair.match_id,
                source: e,
            });
        }

        let wager_delta = pot_delta / 2;
        for tx in [
            Transaction::completed(&wallet_a, Some(pair.match_id), TransactionKind::Bet, -wager_delta),
            Transaction::completed(&wallet_b, Some(pair.match_id), TransactionKind::Bet, -wager_delta),
            Transaction::completed(winner_wallet, Some(pair.match_id), TransactionKind::Win, pot_delta),
        ] {
            if let Err(e) = store.create_transaction(tx).await {
                warn!(match_id = %pair.match_id, error = %e, "ledger transaction not recorded");
            }
        }

        // 9. Stats.
        for (user, wins, losses) in [(winner_user, 1, 0), (loser_user, 0, 1)] {
            if let Err(e) = store.update_stats(&user.id, wins, losses, wager).await {
                warn!(match_id = %pair.match_id, user = %user.id, error = %e, "stats not updated");
            }
        }

        // 10. A's nonce moves on so the same seeds never repeat.
        if let Err(e) = store.increment_nonce(&user_a.id).await {
            error!(match_id = %pair.match_id, user = %user_a.id, error = %e, "nonce not incremented");
        }

        // 11. Result for delivery.
        Ok(MatchResult {
            match_id: pair.match_id,
            winner,
            winner_id: winner_user.id.clone(),
            server_seed,
            server_seed_hashed,
            client_seed_a: user_a.client_seed.clone(),
            client_seed_b: user_b.client_seed.clone(),
            nonce,
            outcome_hash: outcome.hash,
            event_sequence: script,
            wager_amount: wager,
            total_pot,
        })
    }

    async fn find_user(&self, pair: &MatchPair, side: Side) -> Result<User, SettlementError> {
        let seat = match side {
            Side::PlayerA => &pair.player_a,
            Side::PlayerB => &pair.player_b,
        };
        self.store
            .find_user(&seat.participant)
            .await
            .map_err(|source| SettlementError::ParticipantLookup { side, source })
    }

    async fn lock(
        &self,
        user: &User,
        side: Side,
        wager: Lamports,
    ) -> Result<WagerLock, SettlementError> {
        let store = self.store.as_ref();
        let wallet = match store.find_wallet(&user.id, self.config.currency).await {
            Ok(wallet) => wallet,
            Err(StoreError::WalletNotFound { .. }) => {
                return Err(SettlementError::InsufficientBalance {
                    side,
                    requested: wager,
                    available: 0,
                });
            }
            Err(source) => return Err(SettlementError::Ledger { side, source }),
        };

        WagerLock::acquire(store, wallet, wager)
            .await
            .map_err(|e| match e {
                StoreError::InsufficientBalance {
                    requested,
                    available,
                } => SettlementError::InsufficientBalance {
                    side,
                    requested,
                    available,
                },
                source => SettlementError::Ledger { side, source },
            })
    }

    async fn notify(&self, pair: &MatchPair, msg: &ServerMessage) {
        for conn in [pair.player_a.conn, pair.player_b.conn] {
            if let Err(e) = self.hub.send(conn, msg).await {
                warn!(match_id = %pair.match_id, %conn, error = %e, "failed to deliver match notice");
            }
        }
    }
}

impl<S: Store, E: SeedSource> MatchLauncher for GameRoom<S, E> {
    fn launch(&self, pair: MatchPair) {
        let room = self.clone();
        tokio::spawn(async move {
            let match_id = pair.match_id;
            match room.settle(pair).await {
                Ok(_) => {}
                Err(e) if e.is_user_recoverable() => {
                    warn!(%match_id, error = %e, "match aborted");
                }
                Err(e) => {
                    error!(%match_id, error = %e, "match failed");
                }
            }
        });
    }
}

fn fighter(user: &User) -> FighterInfo {
    FighterInfo {
        id: user.id.clone(),
        username: user.username.clone(),
        character: DEFAULT_CHARACTER.to_string(),
        skin: DEFAULT_SKIN.to_string(),
    }
}
