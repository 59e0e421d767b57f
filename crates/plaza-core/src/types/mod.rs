//! Shared types used across all Code Plaza crates.

pub mod clock;
pub mod collection;
pub mod day;
pub mod id;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::Collection;
pub use day::DayKey;
pub use id::Identity;
