//! Repository for the `users` table.

use sqlx::PgPool;

use chime_core::types::DbId;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, timezone_offset_hours, device_token, created_at, updated_at";

/// Provides CRUD operations for recipient users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (timezone_offset_hours, device_token) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.timezone_offset_hours)
            .bind(&input.device_token)
            .fetch_one(pool)
            .await
    }

    /// Fetch the users matching `ids`, in id order.
    ///
    /// Unknown ids are silently absent from the result; the dispatcher
    /// treats a missing user the same as one without a device token.
    pub async fn fetch_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
