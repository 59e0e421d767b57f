//! The greeting state transition.

use plaza_core::types::{DayKey, Identity};
use plaza_entity::GreetingResult;
use plaza_entity::profile::Profile;
use plaza_entity::session::Session;

use super::leveling::LevelingRules;
use super::rollover::ensure_current_day;

/// What a greeting attempt did to the greeter's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingOutcome {
    /// Greeter and greeted are the same identity; nothing changed.
    SelfGreeting,
    /// Already greeted today; only a rollover may have changed the session.
    AlreadyGreeted {
        /// Whether the greeted-set was reset for a new day.
        rolled_over: bool,
    },
    /// Recorded in the greeted-set, but there was no profile to award.
    RecordedWithoutProfile,
    /// Recorded and experience awarded.
    Awarded(GreetingResult),
}

impl GreetingOutcome {
    /// The award, if any.
    pub fn award(&self) -> Option<GreetingResult> {
        match self {
            Self::Awarded(result) => Some(*result),
            _ => None,
        }
    }

    /// Whether the session must be written back.
    pub fn session_changed(&self) -> bool {
        match self {
            Self::SelfGreeting => false,
            Self::AlreadyGreeted { rolled_over } => *rolled_over,
            Self::RecordedWithoutProfile | Self::Awarded(_) => true,
        }
    }
}

/// Apply one greeting to the greeter's session and profile.
///
/// The rollover check runs before the membership check, so a greeting on
/// a new day is always eligible again.
pub fn apply_greeting(
    session: &mut Session,
    profile: Option<&mut Profile>,
    greeted: &Identity,
    today: DayKey,
    rules: &LevelingRules,
) -> GreetingOutcome {
    if &session.identity == greeted {
        return GreetingOutcome::SelfGreeting;
    }

    let rolled_over = ensure_current_day(session, today);
    if !session.greeted_today.insert(greeted.clone()) {
        return GreetingOutcome::AlreadyGreeted { rolled_over };
    }

    match profile {
        Some(profile) => GreetingOutcome::Awarded(rules.award(profile)),
        None => GreetingOutcome::RecordedWithoutProfile,
    }
}
