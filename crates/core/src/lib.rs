//! Pure scheduling and eligibility logic for the chime dispatch engine.
//!
//! Everything in this crate is deterministic and IO-free:
//!
//! - [`recurrence`] — recurrence kinds and delivery progress states.
//! - [`schedule`] — send windows, wire formats, randomized instant draws.
//! - [`timeshift`] — flat-hour timezone shifts of the cycle reference.
//! - [`ledger`] — the per-user idempotency ledger.
//! - [`eligibility`] — the per-user gate chain over a shifted local clock.
//!
//! The `db` crate maps rows into these types; the `push` crate drives them
//! from the dispatch cycle.

pub mod eligibility;
pub mod ledger;
pub mod recurrence;
pub mod schedule;
pub mod timeshift;
pub mod types;

pub use eligibility::is_eligible;
pub use ledger::SendRecord;
pub use recurrence::{DeliveryProgress, Recurrence};
pub use schedule::{Schedule, ScheduleError};
