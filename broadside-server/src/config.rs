//! Engine configuration.
//!
//! Tunables only; wiring the collaborators is the embedding server's job.

use std::time::Duration;

use crate::store::codec::StateCodec;
use crate::{ACTION_TTL_SECS, PLACEMENT_ATTEMPTS, SNAPSHOT_INTERVAL};

/// Configuration for the engine and its glue.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Snapshot every N-th turn (turn % N == 0).
    pub snapshot_interval: u32,
    /// Lifetime of an idempotency key.
    pub action_ttl: Duration,
    /// Placement attempts per ship.
    pub placement_attempts: u32,
    /// Encoding of the cached state.
    pub state_codec: StateCodec,
    /// Capacity of the in-process broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: SNAPSHOT_INTERVAL,
            action_ttl: Duration::from_secs(ACTION_TTL_SECS),
            placement_attempts: PLACEMENT_ATTEMPTS,
            state_codec: StateCodec::Json,
            event_channel_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            snapshot_interval: env_parse("BROADSIDE_SNAPSHOT_INTERVAL")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.snapshot_interval),
            action_ttl: env_parse("BROADSIDE_ACTION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.action_ttl),
            placement_attempts: env_parse("BROADSIDE_PLACEMENT_ATTEMPTS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(defaults.placement_attempts),
            state_codec: std::env::var("BROADSIDE_STATE_CODEC")
                .ok()
                .and_then(|v| StateCodec::from_name(&v))
                .unwrap_or(defaults.state_codec),
            event_channel_capacity: env_parse("BROADSIDE_EVENT_CHANNEL_CAPACITY")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.event_channel_capacity),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.snapshot_interval, 5);
        assert_eq!(config.action_ttl, Duration::from_secs(300));
        assert_eq!(config.placement_attempts, 1000);
        assert_eq!(config.state_codec, StateCodec::Json);
    }

    #[test]
    fn test_from_env_overrides_and_ignores_garbage() {
        // Only this test touches these variables
        std::env::set_var("BROADSIDE_SNAPSHOT_INTERVAL", "3");
        std::env::set_var("BROADSIDE_ACTION_TTL_SECS", "nope");
        std::env::set_var("BROADSIDE_STATE_CODEC", "bincode");

        let config = EngineConfig::from_env();
        assert_eq!(config.snapshot_interval, 3);
        assert_eq!(config.action_ttl, Duration::from_secs(300));
        assert_eq!(config.state_codec, StateCodec::Bincode);

        std::env::remove_var("BROADSIDE_SNAPSHOT_INTERVAL");
        std::env::remove_var("BROADSIDE_ACTION_TTL_SECS");
        std::env::remove_var("BROADSIDE_STATE_CODEC");
    }
}
