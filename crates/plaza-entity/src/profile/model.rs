//! Profile entity model.

use serde::{Deserialize, Serialize};
use validator::Validate;

use plaza_core::error::AppError;

use super::avatar::{self, DEFAULT_AVATAR};

/// Maximum length of a display name, in characters.
pub const MAX_NAME_LEN: u64 = 32;
/// Maximum length of a status message, in characters.
pub const MAX_MESSAGE_LEN: u64 = 140;

/// User-chosen display data plus progression.
///
/// `exp` never decreases and `level` is always derived from it; only the
/// greeting transaction changes either of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name.
    #[validate(length(min = 1, max = 32, message = "Name must be 1-32 characters"))]
    pub name: String,
    /// Code into the fixed avatar catalog.
    pub avatar_code: String,
    /// Optional short status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 140, message = "Message must be at most 140 characters"))]
    pub message: Option<String>,
    /// Accumulated experience.
    #[serde(default)]
    pub exp: u64,
    /// Level derived from `exp`.
    #[serde(default = "default_level")]
    pub level: u32,
}

/// A partially filled profile, as submitted by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar code.
    #[serde(default)]
    pub avatar_code: Option<String>,
    /// Status message.
    #[serde(default)]
    pub message: Option<String>,
    /// Experience, if the client echoes it back.
    #[serde(default)]
    pub exp: Option<u64>,
    /// Level, if the client echoes it back.
    #[serde(default)]
    pub level: Option<u32>,
}

impl Profile {
    /// Fill a draft with defaults: empty name, the default avatar,
    /// no message, zero experience, level 1.
    pub fn initial(draft: ProfileDraft) -> Self {
        Self {
            name: draft.name.unwrap_or_default(),
            avatar_code: draft
                .avatar_code
                .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            message: draft.message,
            exp: draft.exp.unwrap_or(0),
            level: draft.level.unwrap_or_else(default_level),
        }
    }

    /// Trim name and message; an empty message becomes `None`.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.message = self
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        self
    }

    /// Keep display fields from `self` but progression from `previous`.
    ///
    /// Submitted profiles cannot grant themselves experience.
    pub fn with_progression_of(mut self, previous: Option<&Profile>) -> Self {
        match previous {
            Some(prev) => {
                self.exp = prev.exp;
                self.level = prev.level;
            }
            None => {
                self.exp = 0;
                self.level = default_level();
            }
        }
        self
    }

    /// Validate field lengths and that the avatar exists in the catalog.
    pub fn check(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Please enter a name"));
        }
        self.validate().map_err(|e| {
            let detail = e
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| "Invalid profile".to_string());
            AppError::validation(detail)
        })?;
        if avatar::find(&self.avatar_code).is_none() {
            return Err(AppError::validation(format!(
                "Unknown avatar '{}'",
                self.avatar_code
            )));
        }
        Ok(())
    }
}

fn default_level() -> u32 {
    1
}
