//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus `Deserialize` create DTOs for inserts. Schedule
//! dates and times serialize in the wire formats (`YYYY/MM/DD`, `HH:MM`).

pub mod audience;
pub mod push_notification;
pub mod user;

pub use audience::Audience;
pub use push_notification::{CreatePushNotification, PushNotification};
pub use user::{CreateUser, User};
