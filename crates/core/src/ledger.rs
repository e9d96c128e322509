//! Per-user idempotency ledger.
//!
//! Each definition carries a list of send records, at most one per user,
//! marking the user-local date a push went out. A surviving entry blocks
//! re-delivery for the rest of that user's period; period rollover purges it
//! so the next window instance can fire. Without the purge a recurring
//! definition would fire exactly once per user and then go silent.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::recurrence::Recurrence;
use crate::schedule::Schedule;
use crate::types::DbId;

/// One ledger entry: the user-local date a send went out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRecord {
    pub user_id: DbId,
    #[serde(with = "crate::schedule::date_format")]
    pub sent_on: NaiveDate,
}

/// Look up a user's ledger entry.
pub fn entry_for(ledger: &[SendRecord], user_id: DbId) -> Option<&SendRecord> {
    ledger.iter().find(|record| record.user_id == user_id)
}

/// Record a send for a user, replacing any earlier entry.
pub fn record_send(ledger: &mut Vec<SendRecord>, user_id: DbId, sent_on: NaiveDate) {
    if let Some(entry) = ledger.iter_mut().find(|record| record.user_id == user_id) {
        entry.sent_on = sent_on;
    } else {
        ledger.push(SendRecord { user_id, sent_on });
    }
}

/// Purge a user's stale entry ahead of re-evaluation.
///
/// An entry is stale when the recurrence repeats, the entry predates the
/// user's current local date, and the schedule still contains that local
/// date. SINGLE entries are never purged: one send consumes the definition
/// for that user permanently.
///
/// Returns `true` when an entry was removed.
pub fn purge_stale(
    ledger: &mut Vec<SendRecord>,
    user_id: DbId,
    recurrence: Recurrence,
    schedule: &Schedule,
    local_date: NaiveDate,
) -> bool {
    if recurrence == Recurrence::Single || !schedule.contains(local_date) {
        return false;
    }
    let before = ledger.len();
    ledger.retain(|record| !(record.user_id == user_id && record.sent_on < local_date));
    ledger.len() != before
}
