//! Notification schedule windows and randomized send instants.
//!
//! A definition fires either at a fixed local time (`window_end` absent) or
//! at a random minute drawn from `[window_start, window_end)` once per window
//! instance and memoized, so every user in every timezone is compared against
//! the same instant. All comparisons are minute precision. On the wire, dates
//! travel as `YYYY/MM/DD` and times as `HH:MM` (24-hour).

use chrono::{NaiveDate, NaiveTime, Timelike};
use rand::Rng;
use thiserror::Error;

/// Canonical wire format for schedule dates.
pub const DATE_FORMAT: &str = "%Y/%m/%d";

/// Canonical wire format for schedule times (24-hour, minute precision).
pub const TIME_FORMAT: &str = "%H:%M";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Validation failures for schedule fields and send windows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    /// Randomized window whose end does not lie strictly after its start.
    #[error("invalid send window: end {end} is not after start {start}")]
    InvalidWindow { start: NaiveTime, end: NaiveTime },

    #[error("invalid schedule date {0:?}, expected YYYY/MM/DD")]
    InvalidDate(String),

    #[error("invalid schedule time {0:?}, expected HH:MM")]
    InvalidTime(String),
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// When a notification definition is allowed to fire, in user-local terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// First active date (inclusive).
    pub starts_on: NaiveDate,
    /// Last active date (inclusive).
    pub ends_on: NaiveDate,
    /// ISO weekday 1 (Monday) through 7 (Sunday). Set for WEEKLY definitions.
    pub day_of_week: Option<u8>,
    /// Fixed send time, or the start of the randomized window.
    pub window_start: NaiveTime,
    /// End of the randomized window. Absent on fixed-time definitions.
    pub window_end: Option<NaiveTime>,
}

impl Schedule {
    /// Inclusive containment check against the active date range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.starts_on <= date && date <= self.ends_on
    }

    /// Whether the send time is drawn from a window rather than fixed.
    ///
    /// The two modes are mutually exclusive per definition: `window_end`
    /// absent means "fire at exactly `window_start`".
    pub fn is_randomized(&self) -> bool {
        self.window_end.is_some()
    }
}

// ---------------------------------------------------------------------------
// Wire format helpers
// ---------------------------------------------------------------------------

/// Parse a `YYYY/MM/DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| ScheduleError::InvalidDate(s.to_string()))
}

/// Parse an `HH:MM` time.
pub fn parse_time(s: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|_| ScheduleError::InvalidTime(s.to_string()))
}

/// Render a date in the `YYYY/MM/DD` wire format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Render a time in the `HH:MM` wire format.
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

// ---------------------------------------------------------------------------
// Randomized send instants
// ---------------------------------------------------------------------------

/// Draw a uniformly random minute-precision instant in `[start, end)`.
///
/// The random source is injected so callers control determinism; production
/// passes `rand::rng()`, tests pass a seeded `StdRng`.
pub fn pick_send_instant(
    start: NaiveTime,
    end: NaiveTime,
    rng: &mut impl Rng,
) -> Result<NaiveTime, ScheduleError> {
    let start = truncate_to_minute(start);
    let end = truncate_to_minute(end);
    if end <= start {
        return Err(ScheduleError::InvalidWindow { start, end });
    }
    let drawn = rng.random_range(minute_of_day(start)..minute_of_day(end));
    Ok(time_from_minute_of_day(drawn))
}

/// Decide whether a windowed definition needs a fresh randomized instant.
///
/// A draw is due when no instant is memoized yet, or when a dispatch was
/// recorded in an earlier period (`last_sent_on < today`), which marks the
/// memoized instant as consumed. A memoized instant with no recorded send is
/// kept as-is so repeated cycles inside one window instance all compare
/// against the same time.
pub fn needs_fresh_instant(
    last_random_time: Option<NaiveTime>,
    last_sent_on: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    match (last_random_time, last_sent_on) {
        (None, _) => true,
        (Some(_), Some(sent_on)) => sent_on < today,
        (Some(_), None) => false,
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_from_minute_of_day(minute: u32) -> NaiveTime {
    // minute < 1440 whenever the input came from minute_of_day.
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap_or(NaiveTime::MIN)
}

// ---------------------------------------------------------------------------
// Serde adapters for the wire formats
// ---------------------------------------------------------------------------

/// Serialize/deserialize a `NaiveDate` as `YYYY/MM/DD`.
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_date(&s).map_err(serde::de::Error::custom)
    }
}

/// Serialize/deserialize a `NaiveTime` as `HH:MM`.
pub mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_time(&s).map_err(serde::de::Error::custom)
    }
}

/// `Option` variant of [`date_format`].
pub mod opt_date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&super::format_date(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| super::parse_date(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// `Option` variant of [`time_format`].
pub mod opt_time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_some(&super::format_time(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| super::parse_time(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
