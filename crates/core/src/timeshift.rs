//! Timezone shifting of the cycle reference instant.
//!
//! Users carry a flat hour offset from UTC (no DST rules). Every eligibility
//! decision shifts the single reference "now" captured at the top of a cycle
//! into the user's local clock; the shift may cross a date or weekday
//! boundary in either direction.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Shift the UTC reference instant into a user's local clock.
pub fn shift_to_user_local(reference: NaiveDateTime, offset_hours: i32) -> NaiveDateTime {
    reference + Duration::hours(i64::from(offset_hours))
}

/// ISO weekday number, 1 (Monday) through 7 (Sunday).
pub fn iso_weekday(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}
