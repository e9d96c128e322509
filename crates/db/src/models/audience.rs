//! Audience (named recipient group) model.

use serde::Serialize;
use sqlx::FromRow;

use chime_core::types::{DbId, Timestamp};

/// A row from the `audiences` table. Membership lives in `audience_members`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Audience {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}
