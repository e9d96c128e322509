//! Repository for the `push_notifications` table.

use sqlx::types::Json;
use sqlx::PgPool;

use chime_core::recurrence::Recurrence;
use chime_core::types::DbId;

use crate::models::push_notification::{CreatePushNotification, PushNotification};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, body, recurrence_id, starts_on, ends_on, day_of_week, \
                        window_start, window_end, last_random_time, last_sent_on, \
                        target_user_ids, audience_id, notified_users, attempts, progress_id, \
                        created_at, updated_at";

/// Provides CRUD operations for push notification definitions.
pub struct PushNotificationRepo;

impl PushNotificationRepo {
    /// Insert a new definition, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePushNotification,
    ) -> Result<PushNotification, sqlx::Error> {
        let query = format!(
            "INSERT INTO push_notifications \
                (title, body, recurrence_id, starts_on, ends_on, day_of_week, \
                 window_start, window_end, target_user_ids, audience_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PushNotification>(&query)
            .bind(&input.title)
            .bind(&input.body)
            .bind(input.recurrence_id)
            .bind(input.starts_on)
            .bind(input.ends_on)
            .bind(input.day_of_week)
            .bind(input.window_start)
            .bind(input.window_end)
            .bind(Json(&input.target_user_ids))
            .bind(input.audience_id)
            .fetch_one(pool)
            .await
    }

    /// Find a definition by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PushNotification>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM push_notifications WHERE id = $1");
        sqlx::query_as::<_, PushNotification>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every definition of one recurrence kind, oldest first.
    pub async fn list_by_recurrence(
        pool: &PgPool,
        recurrence: Recurrence,
    ) -> Result<Vec<PushNotification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM push_notifications \
             WHERE recurrence_id = $1 \
             ORDER BY id"
        );
        sqlx::query_as::<_, PushNotification>(&query)
            .bind(recurrence.id())
            .fetch_all(pool)
            .await
    }

    /// Persist the engine-mutable fields after a dispatch pass.
    ///
    /// Writes unconditionally; the store performs no validation and no
    /// concurrency check. The dispatch pipeline owns the row exclusively.
    pub async fn save(pool: &PgPool, definition: &PushNotification) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE push_notifications \
             SET last_random_time = $2, \
                 last_sent_on = $3, \
                 notified_users = $4, \
                 attempts = $5, \
                 progress_id = $6, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(definition.id)
        .bind(definition.last_random_time)
        .bind(definition.last_sent_on)
        .bind(&definition.notified_users)
        .bind(definition.attempts)
        .bind(definition.progress_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
