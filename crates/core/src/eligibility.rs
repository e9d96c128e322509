//! Per-user eligibility evaluation.
//!
//! All gates compare against the user's shifted local clock at minute
//! precision. The decision itself is read-only: callers purge stale ledger
//! entries first ([`crate::ledger::purge_stale`]), then evaluate. Evaluating
//! the same inputs twice always yields the same answer, so a definition can
//! be re-checked any number of times inside one window instance.

use chrono::{NaiveDateTime, NaiveTime};

use crate::ledger::{self, SendRecord};
use crate::recurrence::Recurrence;
use crate::schedule::{truncate_to_minute, Schedule};
use crate::timeshift;
use crate::types::DbId;

/// Decide whether a user should receive a definition at their local "now".
///
/// Gates, in order: active date range, window-start time, idempotency ledger,
/// WEEKLY weekday match, randomized-instant match. `last_random_time` is the
/// definition's memoized draw; a randomized definition with no draw yet is
/// never eligible (the evaluator never draws).
pub fn is_eligible(
    recurrence: Recurrence,
    schedule: &Schedule,
    last_random_time: Option<NaiveTime>,
    ledger: &[SendRecord],
    user_id: DbId,
    now_local: NaiveDateTime,
) -> bool {
    let local_date = now_local.date();
    let local_time = truncate_to_minute(now_local.time());

    if !schedule.contains(local_date) {
        return false;
    }
    if local_time < truncate_to_minute(schedule.window_start) {
        return false;
    }
    if ledger::entry_for(ledger, user_id).is_some() {
        return false;
    }
    if recurrence == Recurrence::Weekly {
        match schedule.day_of_week {
            Some(weekday) if timeshift::iso_weekday(local_date) == weekday => {}
            _ => return false,
        }
    }
    if schedule.is_randomized() {
        match last_random_time {
            Some(instant) if local_time >= truncate_to_minute(instant) => {}
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn fixed_nine(day_of_week: Option<u8>) -> Schedule {
        Schedule {
            starts_on: date(2026, 5, 1),
            ends_on: date(2026, 5, 31),
            day_of_week,
            window_start: time(9, 0),
            window_end: None,
        }
    }

    fn windowed(start: NaiveTime, end: NaiveTime) -> Schedule {
        Schedule {
            window_end: Some(end),
            window_start: start,
            ..fixed_nine(None)
        }
    }

    // -----------------------------------------------------------------------
    // Date and time gates
    // -----------------------------------------------------------------------

    #[test]
    fn before_window_start_is_ineligible() {
        let schedule = fixed_nine(None);
        assert!(!is_eligible(
            Recurrence::Single,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 6, 8, 55)
        ));
    }

    #[test]
    fn at_window_start_is_eligible() {
        let schedule = fixed_nine(None);
        assert!(is_eligible(
            Recurrence::Single,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 6, 9, 0)
        ));
    }

    #[test]
    fn after_window_start_is_eligible() {
        let schedule = fixed_nine(None);
        assert!(is_eligible(
            Recurrence::Single,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 6, 9, 5)
        ));
    }

    #[test]
    fn outside_date_range_is_ineligible() {
        let schedule = fixed_nine(None);
        assert!(!is_eligible(
            Recurrence::Daily,
            &schedule,
            None,
            &[],
            1,
            at(2026, 4, 30, 12, 0)
        ));
        assert!(!is_eligible(
            Recurrence::Daily,
            &schedule,
            None,
            &[],
            1,
            at(2026, 6, 1, 12, 0)
        ));
    }

    #[test]
    fn range_end_date_is_still_eligible() {
        let schedule = fixed_nine(None);
        assert!(is_eligible(
            Recurrence::Daily,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 31, 9, 0)
        ));
    }

    #[test]
    fn seconds_do_not_affect_the_time_gate() {
        let schedule = fixed_nine(None);
        let now = date(2026, 5, 6).and_hms_opt(9, 0, 59).unwrap();
        assert!(is_eligible(Recurrence::Daily, &schedule, None, &[], 1, now));
    }

    // -----------------------------------------------------------------------
    // Ledger gate
    // -----------------------------------------------------------------------

    #[test]
    fn ledger_entry_blocks_redelivery() {
        let schedule = fixed_nine(None);
        let ledger = vec![SendRecord { user_id: 1, sent_on: date(2026, 5, 6) }];
        assert!(!is_eligible(
            Recurrence::Daily,
            &schedule,
            None,
            &ledger,
            1,
            at(2026, 5, 6, 9, 10)
        ));
    }

    #[test]
    fn other_users_entries_do_not_block() {
        let schedule = fixed_nine(None);
        let ledger = vec![SendRecord { user_id: 2, sent_on: date(2026, 5, 6) }];
        assert!(is_eligible(
            Recurrence::Daily,
            &schedule,
            None,
            &ledger,
            1,
            at(2026, 5, 6, 9, 10)
        ));
    }

    // -----------------------------------------------------------------------
    // WEEKLY weekday gate
    // -----------------------------------------------------------------------

    #[test]
    fn weekly_fires_only_on_its_weekday() {
        // 2026-05-06 is a Wednesday (ISO 3).
        let schedule = fixed_nine(Some(3));
        assert!(is_eligible(
            Recurrence::Weekly,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 6, 9, 0)
        ));
        assert!(!is_eligible(
            Recurrence::Weekly,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 7, 9, 0)
        ));
        assert!(!is_eligible(
            Recurrence::Weekly,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 5, 9, 0)
        ));
    }

    #[test]
    fn weekly_without_weekday_never_fires() {
        let schedule = fixed_nine(None);
        assert!(!is_eligible(
            Recurrence::Weekly,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 6, 9, 0)
        ));
    }

    #[test]
    fn weekday_gate_ignores_non_weekly_definitions() {
        let schedule = fixed_nine(Some(3));
        assert!(is_eligible(
            Recurrence::Daily,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 7, 9, 0)
        ));
    }

    // -----------------------------------------------------------------------
    // Randomized instant gate
    // -----------------------------------------------------------------------

    #[test]
    fn randomized_without_draw_is_ineligible() {
        let schedule = windowed(time(9, 0), time(10, 0));
        assert!(!is_eligible(
            Recurrence::Daily,
            &schedule,
            None,
            &[],
            1,
            at(2026, 5, 6, 9, 30)
        ));
    }

    #[test]
    fn randomized_before_drawn_instant_is_ineligible() {
        let schedule = windowed(time(9, 0), time(10, 0));
        assert!(!is_eligible(
            Recurrence::Daily,
            &schedule,
            Some(time(9, 45)),
            &[],
            1,
            at(2026, 5, 6, 9, 30)
        ));
    }

    #[test]
    fn randomized_at_drawn_instant_is_eligible() {
        let schedule = windowed(time(9, 0), time(10, 0));
        assert!(is_eligible(
            Recurrence::Daily,
            &schedule,
            Some(time(9, 45)),
            &[],
            1,
            at(2026, 5, 6, 9, 45)
        ));
    }

    #[test]
    fn repeated_evaluation_against_one_draw_is_stable() {
        let schedule = windowed(time(9, 0), time(10, 0));
        let drawn = Some(time(9, 17));
        for _ in 0..3 {
            assert!(is_eligible(
                Recurrence::Daily,
                &schedule,
                drawn,
                &[],
                1,
                at(2026, 5, 6, 9, 20)
            ));
        }
    }
}
