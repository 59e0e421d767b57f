//! Roster listing.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use plaza_core::error::AppError;
use plaza_entity::presence::{Roster, RosterEntry};

/// Roster display row
#[derive(Debug, Serialize, Tabled)]
pub struct RosterRow {
    /// Identity
    uid: String,
    /// Display name
    name: String,
    /// Avatar
    avatar: String,
    /// Level
    level: u32,
    /// Experience
    exp: u64,
    /// Liveness
    state: String,
    /// Last heartbeat (UTC)
    last_seen: String,
    /// Greeted today
    greeted: usize,
}

impl From<&RosterEntry> for RosterRow {
    fn from(entry: &RosterEntry) -> Self {
        Self {
            uid: entry.identity.to_string(),
            name: entry.profile.name.clone(),
            avatar: entry.profile.avatar_code.clone(),
            level: entry.profile.level,
            exp: entry.profile.exp,
            state: entry.state.to_string(),
            last_seen: entry.last_heartbeat.format("%Y-%m-%d %H:%M:%S").to_string(),
            greeted: entry.greeted_today.len(),
        }
    }
}

/// Print a roster in the selected format
pub fn print_roster(roster: &Roster, format: OutputFormat) {
    let rows: Vec<RosterRow> = roster.entries.iter().map(RosterRow::from).collect();
    output::print_list(&rows, format);
}

/// Execute the roster command
pub async fn execute(config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let engine = super::connect_engine(config_path).await?;
    let roster = engine.roster().await?;
    print_roster(&roster, format);
    Ok(())
}
