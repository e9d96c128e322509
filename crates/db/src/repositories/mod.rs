//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument and return `sqlx::Error` unwrapped.

pub mod audience_repo;
pub mod push_notification_repo;
pub mod user_repo;

pub use audience_repo::AudienceRepo;
pub use push_notification_repo::PushNotificationRepo;
pub use user_repo::UserRepo;
