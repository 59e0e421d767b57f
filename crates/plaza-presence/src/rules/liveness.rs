//! Liveness classification from heartbeat age.

use chrono::{DateTime, Duration, Utc};

use plaza_core::config::presence::PresenceConfig;
use plaza_entity::presence::LivenessState;
use plaza_entity::session::document::parse_heartbeat;

/// Heartbeat age thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessPolicy {
    /// Up to this age a user is active.
    pub active: Duration,
    /// Up to this age a user is sleeping; beyond it they have exited.
    pub sleep: Duration,
}

impl LivenessPolicy {
    /// Build from configuration.
    pub fn from_config(config: &PresenceConfig) -> Self {
        Self {
            active: Duration::minutes(config.active_threshold_minutes as i64),
            sleep: Duration::minutes(config.sleep_threshold_minutes as i64),
        }
    }

    /// Classify a heartbeat at `now`. Boundaries are inclusive.
    ///
    /// A heartbeat slightly in the future (clock skew between hosts)
    /// counts as active.
    pub fn classify(&self, last_heartbeat: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LivenessState {
        let Some(last) = last_heartbeat else {
            return LivenessState::Exited;
        };
        let delta = now - last;
        if delta <= self.active {
            LivenessState::Active
        } else if delta <= self.sleep {
            LivenessState::Sleeping
        } else {
            LivenessState::Exited
        }
    }

    /// Classify a raw stored timestamp. Unparseable input is `Exited`.
    pub fn classify_raw(&self, raw: Option<&str>, now: DateTime<Utc>) -> LivenessState {
        self.classify(raw.and_then(parse_heartbeat), now)
    }
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self::from_config(&PresenceConfig::default())
    }
}

/// Classify with the default 15/30 minute thresholds.
pub fn classify(last_heartbeat: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LivenessState {
    LivenessPolicy::default().classify(last_heartbeat, now)
}
