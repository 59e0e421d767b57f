//! Outcome of a successful greeting.

use serde::{Deserialize, Serialize};

/// Updated progression after a greeting awarded experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingResult {
    /// Total experience after the award.
    pub exp: u64,
    /// Level recomputed from `exp`.
    pub level: u32,
}
