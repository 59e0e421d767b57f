//! Day rollover of the greeted-set.

use plaza_core::types::DayKey;
use plaza_entity::session::Session;

/// Make `session.greeted_today` valid for `today`.
///
/// If the recorded day is anything other than `today` (including
/// missing), the set is cleared and the day advanced. Returns whether a
/// reset happened.
pub fn ensure_current_day(session: &mut Session, today: DayKey) -> bool {
    if session.greeted_date == Some(today) {
        return false;
    }
    session.greeted_today.clear();
    session.greeted_date = Some(today);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use plaza_core::types::Identity;

    fn day(d: u32) -> DayKey {
        DayKey::from_date(NaiveDate::from_ymd_opt(2024, 5, d).unwrap())
    }

    #[test]
    fn test_same_day_keeps_set() {
        let mut session = Session::new(Identity::from("a"), None, day(1));
        session.greeted_today.insert(Identity::from("b"));
        assert!(!ensure_current_day(&mut session, day(1)));
        assert_eq!(session.greeted_today.len(), 1);
    }

    #[test]
    fn test_new_day_clears_set() {
        let mut session = Session::new(Identity::from("a"), None, day(1));
        session.greeted_today.insert(Identity::from("b"));
        assert!(ensure_current_day(&mut session, day(2)));
        assert!(session.greeted_today.is_empty());
        assert_eq!(session.greeted_date, Some(day(2)));
    }

    #[test]
    fn test_missing_date_is_stale() {
        let mut session = Session::new(Identity::from("a"), None, day(1));
        session.greeted_date = None;
        session.greeted_today.insert(Identity::from("b"));
        assert!(ensure_current_day(&mut session, day(1)));
        assert!(session.greeted_today.is_empty());
    }
}
