//! Presence domain entities.

pub mod roster;
pub mod state;

pub use roster::{Roster, RosterEntry};
pub use state::LivenessState;
