//! Stored shape of a session document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use plaza_core::types::{DayKey, Identity};

use super::model::Session;

/// Session as written to the `sessions` collection.
///
/// Timestamps and dates are stored as strings. Reading is lenient:
/// an unparseable heartbeat reads back as absent and an unparseable
/// greeted date reads back as stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// RFC 3339 heartbeat timestamp.
    #[serde(default)]
    pub last_heartbeat: Option<String>,
    /// Identities greeted on `greeted_date`.
    #[serde(default)]
    pub greeted_today: Vec<String>,
    /// ISO date the greeted list applies to.
    #[serde(default)]
    pub greeted_date: Option<String>,
}

impl SessionDocument {
    /// Convert into a session owned by `identity`.
    pub fn into_session(self, identity: Identity) -> Session {
        Session {
            identity,
            last_heartbeat: self.last_heartbeat.as_deref().and_then(parse_heartbeat),
            greeted_today: self
                .greeted_today
                .into_iter()
                .filter(|s| !s.is_empty())
                .map(Identity::from)
                .collect(),
            greeted_date: self.greeted_date.as_deref().and_then(DayKey::parse),
        }
    }
}

impl From<&Session> for SessionDocument {
    fn from(session: &Session) -> Self {
        Self {
            last_heartbeat: session.last_heartbeat.map(|t| t.to_rfc3339()),
            greeted_today: session
                .greeted_today
                .iter()
                .map(|id| id.as_str().to_string())
                .collect(),
            greeted_date: session.greeted_date.map(|d| d.to_string()),
        }
    }
}

/// Parse a stored heartbeat. Anything that is not a finite RFC 3339
/// instant yields `None`.
pub fn parse_heartbeat(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
