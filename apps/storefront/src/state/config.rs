//! # Configuration State
//!
//! Read-only settings the commands consult at call time.

use std::time::Duration;

use forma_core::AvailabilityMode;
use serde::Serialize;

use crate::config::StorefrontConfig;

/// Storefront behaviour switches, taken from [`StorefrontConfig`] at startup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Hide out-of-stock options from availability results.
    pub strict_availability: bool,

    /// Maximum number of open configuration sessions.
    pub session_limit: usize,

    /// Seconds before an untouched session is discarded.
    pub session_idle_secs: u64,
}

impl ConfigState {
    pub fn from_config(config: &StorefrontConfig) -> Self {
        ConfigState {
            strict_availability: config.strict_availability,
            session_limit: config.session_limit,
            session_idle_secs: config.session_idle_secs,
        }
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    /// Mode for shopper-facing availability queries.
    pub fn availability_mode(&self) -> AvailabilityMode {
        if self.strict_availability {
            AvailabilityMode::Purchasable
        } else {
            AvailabilityMode::Browse
        }
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        ConfigState::from_config(&StorefrontConfig::default())
    }
}
