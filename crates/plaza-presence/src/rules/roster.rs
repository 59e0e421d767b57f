//! Roster composition.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use plaza_core::types::{DayKey, Identity};
use plaza_entity::presence::{Roster, RosterEntry};
use plaza_entity::profile::Profile;
use plaza_entity::session::Session;

use super::liveness::LivenessPolicy;
use super::rollover::ensure_current_day;

/// Join sessions with profiles and drop everything that has exited.
///
/// Sessions without a profile are skipped. Order follows `sessions`.
/// Greeted-sets recorded on a day before `now` are shown empty.
pub fn compose(
    sessions: Vec<Session>,
    profiles: &HashMap<Identity, Profile>,
    policy: &LivenessPolicy,
    now: DateTime<Utc>,
) -> Roster {
    let today = DayKey::of(now);
    let entries = sessions
        .into_iter()
        .filter_map(|mut session| {
            let profile = profiles.get(&session.identity)?;
            let last_heartbeat = session.last_heartbeat?;
            let state = policy.classify(Some(last_heartbeat), now);
            if !state.is_visible() {
                return None;
            }
            ensure_current_day(&mut session, today);
            Some(RosterEntry {
                identity: session.identity,
                last_heartbeat,
                greeted_today: session.greeted_today.into_iter().collect(),
                state,
                profile: profile.clone(),
            })
        })
        .collect();

    Roster {
        entries,
        computed_at: Some(now),
    }
}
