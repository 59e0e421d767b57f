//! Session entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plaza_core::types::{DayKey, Identity};

/// Ephemeral liveness record for one identity.
///
/// `greeted_today` is only meaningful while `greeted_date` is the current
/// day; the presence engine rolls it over before reading or writing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Owner of the session.
    pub identity: Identity,
    /// Last recorded heartbeat. `None` if never recorded or unreadable.
    pub last_heartbeat: Option<DateTime<Utc>>,
    /// Identities greeted on `greeted_date`.
    pub greeted_today: BTreeSet<Identity>,
    /// Day `greeted_today` applies to. `None` if missing or unreadable,
    /// which always counts as stale.
    pub greeted_date: Option<DayKey>,
}

impl Session {
    /// A fresh session with an empty greeted-set for `today`.
    pub fn new(identity: Identity, heartbeat: Option<DateTime<Utc>>, today: DayKey) -> Self {
        Self {
            identity,
            last_heartbeat: heartbeat,
            greeted_today: BTreeSet::new(),
            greeted_date: Some(today),
        }
    }

    /// Whether `other` was greeted on the recorded day.
    pub fn has_greeted(&self, other: &Identity) -> bool {
        self.greeted_today.contains(other)
    }
}
