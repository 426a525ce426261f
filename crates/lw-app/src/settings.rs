//! Runtime settings derived from the configuration DTO.

use std::time::Duration;

use lw_core::config::AppConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Validated timing settings for the synchronization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Minimum spacing between two snapshot deliveries.
    pub throttle_interval: Duration,
    /// How long `select_devices` waits for a selection response.
    pub selection_timeout: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            throttle_interval: Duration::from_secs(lw_core::config::DEFAULT_THROTTLE_INTERVAL_SECS),
            selection_timeout: Duration::from_secs(lw_core::config::DEFAULT_SELECTION_TIMEOUT_SECS),
        }
    }
}

impl TryFrom<&AppConfig> for SyncSettings {
    type Error = ConfigError;

    fn try_from(config: &AppConfig) -> Result<Self, Self::Error> {
        if config.throttle_interval_secs == 0 {
            return Err(ConfigError::ZeroDuration("sync.throttle_interval_secs"));
        }
        if config.selection_timeout_secs == 0 {
            return Err(ConfigError::ZeroDuration("pairing.selection_timeout_secs"));
        }

        Ok(Self {
            throttle_interval: Duration::from_secs(config.throttle_interval_secs),
            selection_timeout: Duration::from_secs(config.selection_timeout_secs),
        })
    }
}
