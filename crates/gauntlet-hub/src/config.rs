//! Hub configuration.

/// Tuning knobs for the hub actor.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Lobby snapshot rate. 0 disables snapshots.
    pub snapshot_rate_hz: u32,
    /// Frames buffered per connection before it is considered unresponsive.
    pub outbound_buffer: usize,
    /// Capacity of the hub's command channel.
    pub command_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            snapshot_rate_hz: 10,
            outbound_buffer: 256,
            command_buffer: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_config_default() {
        let config = HubConfig::default();
        assert_eq!(config.snapshot_rate_hz, 10);
        assert_eq!(config.outbound_buffer, 256);
        assert_eq!(config.command_buffer, 1024);
    }
}
