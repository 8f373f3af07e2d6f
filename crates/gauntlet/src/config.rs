//! Server configuration.

use std::time::Duration;

use gauntlet_arena::{MatchmakerConfig, SettlementConfig};
use gauntlet_hub::HubConfig;
use gauntlet_protocol::Lamports;

use crate::GauntletError;

/// 0.1 SOL.
pub const DEFAULT_WAGER: Lamports = 100_000_000;

/// Everything needed to run a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// A connection silent for this long is closed. The server pings at
    /// [`ServerConfig::ping_interval`] so live clients never hit it.
    pub read_timeout: Duration,
    /// Inbound frames larger than this are rejected with `ERROR`.
    pub max_frame_bytes: usize,
    /// Wager used when `JOIN_QUEUE` omits `wagerAmount`.
    pub default_wager: Lamports,
    pub hub: HubConfig,
    pub matchmaker: MatchmakerConfig,
    pub settlement: SettlementConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            read_timeout: Duration::from_secs(60),
            max_frame_bytes: 512,
            default_wager: DEFAULT_WAGER,
            hub: HubConfig::default(),
            matchmaker: MatchmakerConfig::default(),
            settlement: SettlementConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, with the bind address taken from `GAUNTLET_BIND` or,
    /// failing that, `0.0.0.0:$PORT`.
    pub fn from_env() -> Result<Self, GauntletError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Keepalive period: nine tenths of the read timeout, never zero.
    pub fn ping_interval(&self) -> Duration {
        (self.read_timeout * 9 / 10).max(Duration::from_millis(1))
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, GauntletError> {
        let mut config = Self::default();
        if let Some(addr) = var("GAUNTLET_BIND") {
            config.bind_addr = addr;
        } else if let Some(port) = var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| GauntletError::Config(format!("PORT is not a port number: {port}")))?;
            config.bind_addr = format!("0.0.0.0:{port}");
        }
        Ok(config)
    }
}
