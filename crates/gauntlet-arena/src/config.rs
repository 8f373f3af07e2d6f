//! Matchmaking and settlement configuration.

use gauntlet_store::Currency;

/// Configuration for the matchmaking queue.
#[derive(Debug, Clone)]
pub struct MatchmakerConfig {
    /// Join requests buffered ahead of the pairing loop.
    pub queue_capacity: usize,
}

impl Default for MatchmakerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
        }
    }
}

/// Configuration for settlement runs.
#[derive(Debug, Clone, Default)]
pub struct SettlementConfig {
    /// Currency wagers are drawn from.
    pub currency: Currency,
}
