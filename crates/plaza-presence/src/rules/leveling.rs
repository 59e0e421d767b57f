//! Experience and level rules.

use plaza_core::config::presence::PresenceConfig;
use plaza_entity::GreetingResult;
use plaza_entity::profile::Profile;

/// Experience awarded for the first greeting of a given person per day.
pub const GREETING_EXP: u64 = 120;

/// Experience per level.
pub const EXP_PER_LEVEL: u64 = 300;

/// Level for an experience total using the default step:
/// `max(1, floor(exp / 300) + 1)`.
pub fn level_for_exp(exp: u64) -> u32 {
    LevelingRules::default().level_for(exp)
}

/// Configurable award size and level step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelingRules {
    /// Experience per greeting.
    pub greeting_exp: u64,
    /// Experience per level; never zero.
    pub exp_per_level: u64,
}

impl LevelingRules {
    /// Build from configuration.
    pub fn from_config(config: &PresenceConfig) -> Self {
        Self {
            greeting_exp: config.greeting_exp,
            exp_per_level: config.exp_per_level.max(1),
        }
    }

    /// Level for an experience total.
    pub fn level_for(&self, exp: u64) -> u32 {
        let level = exp / self.exp_per_level.max(1) + 1;
        u32::try_from(level).unwrap_or(u32::MAX).max(1)
    }

    /// Add one greeting's worth of experience to `profile` and recompute
    /// its level.
    pub fn award(&self, profile: &mut Profile) -> GreetingResult {
        profile.exp = profile.exp.saturating_add(self.greeting_exp);
        profile.level = self.level_for(profile.exp);
        GreetingResult {
            exp: profile.exp,
            level: profile.level,
        }
    }
}

impl Default for LevelingRules {
    fn default() -> Self {
        Self {
            greeting_exp: GREETING_EXP,
            exp_per_level: EXP_PER_LEVEL,
        }
    }
}
