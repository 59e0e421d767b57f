//! Pure presence rules. Nothing in here performs I/O.

pub mod greeting;
pub mod leveling;
pub mod liveness;
pub mod rollover;
pub mod roster;
