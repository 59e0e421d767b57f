//! Liveness state definitions.

use serde::{Deserialize, Serialize};

/// Three-state liveness derived from heartbeat age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivenessState {
    /// Heartbeat within the active threshold.
    Active,
    /// Heartbeat older than active but within the sleep threshold.
    Sleeping,
    /// No usable heartbeat, or older than the sleep threshold.
    #[serde(rename = "exit")]
    Exited,
}

impl LivenessState {
    /// Whether entries in this state appear in the roster.
    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Exited)
    }

    /// Return the state as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Sleeping => "sleeping",
            Self::Exited => "exit",
        }
    }
}

impl std::fmt::Display for LivenessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
