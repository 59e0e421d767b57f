//! Stored shape of a profile document.

use serde::{Deserialize, Serialize};

use super::model::Profile;

/// Profile as written to the `users` collection.
///
/// Older documents may lack `exp`/`level`; they read back as 0 and 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Display name.
    pub name: String,
    /// Avatar catalog code.
    pub avatar_code: String,
    /// Status message; empty when unset.
    #[serde(default)]
    pub message: String,
    /// Accumulated experience.
    #[serde(default)]
    pub exp: Option<u64>,
    /// Stored level.
    #[serde(default)]
    pub level: Option<u32>,
}

impl From<&Profile> for ProfileDocument {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            avatar_code: profile.avatar_code.clone(),
            message: profile.message.clone().unwrap_or_default(),
            exp: Some(profile.exp),
            level: Some(profile.level),
        }
    }
}

impl From<ProfileDocument> for Profile {
    fn from(doc: ProfileDocument) -> Self {
        Self {
            name: doc.name,
            avatar_code: doc.avatar_code,
            message: Some(doc.message).filter(|m| !m.is_empty()),
            exp: doc.exp.unwrap_or(0),
            level: doc.level.unwrap_or(1),
        }
    }
}
