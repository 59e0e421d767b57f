//! Calendar-day keys for greeting eligibility.
//!
//! Days are computed in UTC everywhere so that two hosts in different
//! time zones agree on when a greeted-set rolls over.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A UTC calendar day, serialized as an ISO date (`YYYY-MM-DD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// The UTC day containing `now`.
    pub fn of(now: DateTime<Utc>) -> Self {
        Self(now.date_naive())
    }

    /// Build from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// The inner date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Parse an ISO date; returns `None` on malformed input.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
