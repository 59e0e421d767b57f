//! Session host configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the process that acts on behalf of one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Seconds between heartbeats while a profile is active.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Directory holding the persisted identity and cached profile.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Outbound message buffer towards the presentation layer.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
}

impl HostConfig {
    /// Heartbeat cadence as a duration.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            state_dir: default_state_dir(),
            outbound_buffer_size: default_outbound_buffer(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    60
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("data/plaza")
}

fn default_outbound_buffer() -> usize {
    128
}
