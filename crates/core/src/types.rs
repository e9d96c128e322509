/// Database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Audit timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
