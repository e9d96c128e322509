//! Repository for the `audiences` and `audience_members` tables.

use sqlx::PgPool;

use chime_core::types::DbId;

use crate::models::audience::Audience;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, created_at";

/// Provides CRUD operations for audiences and their membership.
pub struct AudienceRepo;

impl AudienceRepo {
    /// Insert a new audience, returning the created row.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Audience, sqlx::Error> {
        let query = format!(
            "INSERT INTO audiences (name) \
             VALUES ($1) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Audience>(&query)
            .bind(name)
            .fetch_one(pool)
            .await
    }

    /// Add a user to an audience. Adding an existing member is a no-op.
    pub async fn add_member(
        pool: &PgPool,
        audience_id: DbId,
        user_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO audience_members (audience_id, user_id) \
             VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(audience_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Member user ids of an audience, in id order.
    pub async fn member_ids(pool: &PgPool, audience_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT user_id FROM audience_members WHERE audience_id = $1 ORDER BY user_id",
        )
        .bind(audience_id)
        .fetch_all(pool)
        .await
    }
}
