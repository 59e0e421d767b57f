//! Presence and leveling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Liveness thresholds and experience rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Heartbeat age (minutes) up to which a user counts as active.
    #[serde(default = "default_active_threshold")]
    pub active_threshold_minutes: u64,
    /// Heartbeat age (minutes) up to which a user counts as sleeping.
    /// Anything older has exited.
    #[serde(default = "default_sleep_threshold")]
    pub sleep_threshold_minutes: u64,
    /// Experience awarded for a first greeting of the day.
    #[serde(default = "default_greeting_exp")]
    pub greeting_exp: u64,
    /// Experience needed per level.
    #[serde(default = "default_exp_per_level")]
    pub exp_per_level: u64,
    /// Buffer size of the store change broadcast channel.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl PresenceConfig {
    /// Active threshold as a duration.
    pub fn active_threshold(&self) -> Duration {
        Duration::from_secs(self.active_threshold_minutes * 60)
    }

    /// Sleeping threshold as a duration.
    pub fn sleep_threshold(&self) -> Duration {
        Duration::from_secs(self.sleep_threshold_minutes * 60)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            active_threshold_minutes: default_active_threshold(),
            sleep_threshold_minutes: default_sleep_threshold(),
            greeting_exp: default_greeting_exp(),
            exp_per_level: default_exp_per_level(),
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_active_threshold() -> u64 {
    15
}

fn default_sleep_threshold() -> u64 {
    30
}

fn default_greeting_exp() -> u64 {
    120
}

fn default_exp_per_level() -> u64 {
    300
}

fn default_channel_buffer() -> usize {
    64
}
