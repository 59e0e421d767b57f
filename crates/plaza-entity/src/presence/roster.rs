//! Roster value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plaza_core::types::Identity;

use super::state::LivenessState;
use crate::profile::Profile;

/// A session joined with its profile and annotated with a computed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// Session owner.
    pub identity: Identity,
    /// Heartbeat the state was computed from.
    pub last_heartbeat: DateTime<Utc>,
    /// Identities this user greeted today.
    pub greeted_today: Vec<Identity>,
    /// Computed liveness; never `Exited` inside a [`Roster`].
    pub state: LivenessState,
    /// Profile snapshot.
    pub profile: Profile,
}

/// The non-exited sessions at one instant.
///
/// Entry order follows the store's iteration order and may differ
/// between emissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    /// Visible entries.
    pub entries: Vec<RosterEntry>,
    /// Instant used to classify every entry.
    pub computed_at: Option<DateTime<Utc>>,
}

impl Roster {
    /// Number of visible entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody is online.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry for `identity`.
    pub fn get(&self, identity: &Identity) -> Option<&RosterEntry> {
        self.entries.iter().find(|e| &e.identity == identity)
    }

    /// Whether `identity` is visible.
    pub fn contains(&self, identity: &Identity) -> bool {
        self.get(identity).is_some()
    }

    /// Identities in emission order.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.entries.iter().map(|e| &e.identity)
    }
}
