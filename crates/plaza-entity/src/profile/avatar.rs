//! Fixed avatar catalog with unlock requirements.

use serde::Serialize;

/// One selectable avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarOption {
    /// Stable code stored in profiles.
    pub code: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Minimum level required.
    pub unlock_level: u32,
    /// Minimum experience required.
    pub unlock_exp: u64,
}

impl AvatarOption {
    /// Whether a user at `level`/`exp` may pick this avatar.
    pub fn is_unlocked_for(&self, level: u32, exp: u64) -> bool {
        level >= self.unlock_level && exp >= self.unlock_exp
    }
}

const fn avatar(code: &'static str, label: &'static str, level: u32, exp: u64) -> AvatarOption {
    AvatarOption {
        code,
        label,
        unlock_level: level,
        unlock_exp: exp,
    }
}

/// The full catalog, in display order.
pub const AVATARS: [AvatarOption; 10] = [
    avatar("cat", "Cat", 1, 0),
    avatar("dog", "Dog", 1, 0),
    avatar("yusha", "Hero", 1, 0),
    avatar("mahotsukai", "Wizard", 1, 0),
    avatar("apple", "Apple", 2, 50),
    avatar("rocket", "Rocket", 3, 100),
    avatar("okami_man", "Werewolf", 5, 200),
    avatar("frog", "Frog", 7, 350),
    avatar("pancake", "Pancake", 10, 500),
    avatar("frankenstein", "Frankenstein", 15, 1000),
];

/// Avatar assigned to drafts that do not pick one.
pub const DEFAULT_AVATAR: &str = "apple";

/// Look up an avatar by code.
pub fn find(code: &str) -> Option<&'static AvatarOption> {
    AVATARS.iter().find(|a| a.code == code)
}

/// Look up an avatar by code, falling back to the first catalog entry.
pub fn resolve(code: &str) -> &'static AvatarOption {
    find(code).unwrap_or(&AVATARS[0])
}

/// All avatars available at the given progression.
pub fn unlocked(level: u32, exp: u64) -> Vec<&'static AvatarOption> {
    AVATARS
        .iter()
        .filter(|a| a.is_unlocked_for(level, exp))
        .collect()
}

/// Whether `code` names an avatar available at the given progression.
/// Unknown codes are never unlocked.
pub fn is_unlocked(code: &str, level: u32, exp: u64) -> bool {
    find(code).is_some_and(|a| a.is_unlocked_for(level, exp))
}
