//! Recipient user model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use chime_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// Flat hour offset from UTC, negative west of Greenwich. No DST rules.
    pub timezone_offset_hours: i32,
    /// Push endpoint for the user's current device. Users without one are
    /// skipped at dispatch time.
    pub device_token: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub timezone_offset_hours: i32,
    pub device_token: Option<String>,
}
