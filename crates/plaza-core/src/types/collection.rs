//! Document collections held by the backing store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two collections the presence engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Profile documents, keyed by identity.
    Users,
    /// Session (heartbeat + greeted-set) documents, keyed by identity.
    Sessions,
}

impl Collection {
    /// Lowercase collection name, as used in store keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Sessions => "sessions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
