//! Push notification definition model and DTOs.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use chime_core::ledger::SendRecord;
use chime_core::recurrence::{DeliveryProgress, Recurrence};
use chime_core::schedule::{self, Schedule};
use chime_core::types::{DbId, Timestamp};

/// A row from the `push_notifications` table.
///
/// `last_random_time`, `last_sent_on`, `notified_users`, `attempts` and
/// `progress_id` are the engine-mutable fields; everything else is owned by
/// the management surface that created the definition.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PushNotification {
    pub id: DbId,
    pub title: String,
    pub body: String,
    pub recurrence_id: i16,
    #[serde(with = "schedule::date_format")]
    pub starts_on: NaiveDate,
    #[serde(with = "schedule::date_format")]
    pub ends_on: NaiveDate,
    /// ISO weekday 1-7, set on WEEKLY definitions.
    pub day_of_week: Option<i16>,
    #[serde(with = "schedule::time_format")]
    pub window_start: NaiveTime,
    #[serde(with = "schedule::opt_time_format")]
    pub window_end: Option<NaiveTime>,
    /// Memoized randomized send instant for the current window instance.
    #[serde(with = "schedule::opt_time_format")]
    pub last_random_time: Option<NaiveTime>,
    /// Reference (UTC) date of the most recent dispatched batch.
    #[serde(with = "schedule::opt_date_format")]
    pub last_sent_on: Option<NaiveDate>,
    /// Explicit recipient ids; when empty, targets come from `audience_id`.
    pub target_user_ids: Json<Vec<DbId>>,
    pub audience_id: Option<DbId>,
    /// Per-user idempotency ledger.
    pub notified_users: Json<Vec<SendRecord>>,
    pub attempts: i32,
    pub progress_id: i16,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PushNotification {
    /// Typed recurrence kind. `None` when the column holds an unseeded ID.
    pub fn recurrence(&self) -> Option<Recurrence> {
        Recurrence::from_id(self.recurrence_id)
    }

    /// Typed delivery progress. `None` when the column holds an unseeded ID.
    pub fn progress(&self) -> Option<DeliveryProgress> {
        DeliveryProgress::from_id(self.progress_id)
    }

    /// Schedule view consumed by the eligibility evaluator.
    pub fn schedule(&self) -> Schedule {
        Schedule {
            starts_on: self.starts_on,
            ends_on: self.ends_on,
            day_of_week: self.day_of_week.and_then(|d| u8::try_from(d).ok()),
            window_start: self.window_start,
            window_end: self.window_end,
        }
    }
}

/// DTO for creating a push notification definition.
#[derive(Debug, Deserialize)]
pub struct CreatePushNotification {
    pub title: String,
    pub body: String,
    pub recurrence_id: i16,
    #[serde(with = "schedule::date_format")]
    pub starts_on: NaiveDate,
    #[serde(with = "schedule::date_format")]
    pub ends_on: NaiveDate,
    pub day_of_week: Option<i16>,
    #[serde(with = "schedule::time_format")]
    pub window_start: NaiveTime,
    #[serde(default, with = "schedule::opt_time_format")]
    pub window_end: Option<NaiveTime>,
    #[serde(default)]
    pub target_user_ids: Vec<DbId>,
    pub audience_id: Option<DbId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_view_maps_columns() {
        let row = PushNotification {
            id: 1,
            title: "Morning check-in".into(),
            body: "Time to check in".into(),
            recurrence_id: Recurrence::Weekly.id(),
            starts_on: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
            day_of_week: Some(3),
            window_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            window_end: Some(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
            last_random_time: None,
            last_sent_on: None,
            target_user_ids: Json(vec![7]),
            audience_id: None,
            notified_users: Json(Vec::new()),
            attempts: 0,
            progress_id: DeliveryProgress::Active.id(),
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
        };

        let schedule = row.schedule();
        assert_eq!(schedule.day_of_week, Some(3));
        assert!(schedule.is_randomized());
        assert_eq!(row.recurrence(), Some(Recurrence::Weekly));
        assert_eq!(row.progress(), Some(DeliveryProgress::Active));
    }

    #[test]
    fn create_dto_accepts_wire_formats() {
        let dto: CreatePushNotification = serde_json::from_str(
            r#"{
                "title": "Hydration",
                "body": "Drink water",
                "recurrence_id": 2,
                "starts_on": "2026/05/01",
                "ends_on": "2026/05/31",
                "day_of_week": null,
                "window_start": "09:00",
                "window_end": "10:30",
                "audience_id": 4
            }"#,
        )
        .unwrap();
        assert_eq!(dto.window_end, Some(NaiveTime::from_hms_opt(10, 30, 0).unwrap()));
        assert!(dto.target_user_ids.is_empty());
        assert_eq!(dto.audience_id, Some(4));
    }
}
