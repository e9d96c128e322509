//! Dispatch aggregation for one notification definition.
//!
//! A pass over a definition refreshes its randomized send instant, resolves
//! its targets, evaluates every recipient against their shifted local clock,
//! makes at most one transport call, folds the outcome into the ledger and
//! progress state, and persists the definition once at the end. The
//! definition flows through by exclusive ownership; nothing else writes it
//! mid-pass.

use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use sqlx::PgPool;

use chime_core::recurrence::DeliveryProgress;
use chime_core::types::DbId;
use chime_core::{eligibility, ledger, schedule, timeshift};
use chime_db::models::{PushNotification, User};
use chime_db::repositories::{AudienceRepo, PushNotificationRepo, UserRepo};

use crate::transport::{BatchOutcome, PushTransport};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Counts produced by one definition's dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Devices the gateway accepted the message for.
    pub delivered: i64,
    /// Devices that failed: rejected by the gateway, or part of a batch
    /// whose counts never came back.
    pub errors: i64,
}

// ---------------------------------------------------------------------------
// Pure planning steps
// ---------------------------------------------------------------------------

/// Refresh the memoized randomized instant ahead of evaluation.
///
/// Fixed-time definitions are untouched. A draw only happens when the memo
/// is missing or the previous window instance was consumed by a recorded
/// send, and the memo is cleared before drawing. A degenerate window logs a
/// warning and draws nothing, leaving the memo unset so windowed users stay
/// ineligible until the definition is fixed.
pub fn refresh_send_instant(
    definition: &mut PushNotification,
    today_utc: NaiveDate,
    rng: &mut impl Rng,
) {
    let sched = definition.schedule();
    let Some(window_end) = sched.window_end else {
        return;
    };
    if !schedule::needs_fresh_instant(definition.last_random_time, definition.last_sent_on, today_utc)
    {
        return;
    }
    // Cleared first: a failed draw must not leave the consumed instance's
    // instant armed.
    definition.last_random_time = None;
    match schedule::pick_send_instant(sched.window_start, window_end, rng) {
        Ok(instant) => definition.last_random_time = Some(instant),
        Err(e) => {
            tracing::warn!(
                notification_id = definition.id,
                error = %e,
                "Skipping randomized draw for degenerate window"
            );
        }
    }
}

/// Evaluate every fetched user and return the eligible ones.
///
/// Users without a device token are skipped outright. For the rest, stale
/// ledger entries are purged against the user's local date before the gate
/// chain runs, so period rollover and re-evaluation happen in one sweep.
pub fn select_eligible<'a>(
    definition: &mut PushNotification,
    users: &'a [User],
    reference_now: NaiveDateTime,
) -> Vec<&'a User> {
    let Some(recurrence) = definition.recurrence() else {
        tracing::warn!(
            notification_id = definition.id,
            recurrence_id = definition.recurrence_id,
            "Unknown recurrence id, no users eligible"
        );
        return Vec::new();
    };
    let sched = definition.schedule();

    let mut eligible = Vec::new();
    for user in users {
        if user.device_token.is_none() {
            tracing::debug!(user_id = user.id, "Skipping user without device token");
            continue;
        }
        let now_local = timeshift::shift_to_user_local(reference_now, user.timezone_offset_hours);
        ledger::purge_stale(
            &mut definition.notified_users.0,
            user.id,
            recurrence,
            &sched,
            now_local.date(),
        );
        if eligibility::is_eligible(
            recurrence,
            &sched,
            definition.last_random_time,
            &definition.notified_users.0,
            user.id,
            now_local,
        ) {
            eligible.push(user);
        }
    }
    eligible
}

/// Fold a batch outcome into the definition after a transport call.
///
/// Every eligible user is ledgered with their own local date regardless of
/// the per-batch failure count: the gateway reports counts without device
/// identity, so a partial failure cannot be attributed to anyone.
/// `last_sent_on` records the reference date, marking the current window
/// instance consumed.
pub fn apply_outcome(
    definition: &mut PushNotification,
    eligible: &[&User],
    outcome: &BatchOutcome,
    reference_now: NaiveDateTime,
) {
    for user in eligible {
        let local_date =
            timeshift::shift_to_user_local(reference_now, user.timezone_offset_hours).date();
        ledger::record_send(&mut definition.notified_users.0, user.id, local_date);
    }
    definition.last_sent_on = Some(reference_now.date());
    definition.attempts += 1;
    if outcome.failure > 0 {
        definition.progress_id = DeliveryProgress::Error.id();
    } else if outcome.success > 0 {
        definition.progress_id = DeliveryProgress::Success.id();
    }
}

/// Fold a request-level transport failure into the definition.
///
/// No counts came back, so nothing is ledgered, `last_sent_on` stays put,
/// and the memoized instant remains armed; the next cycle re-attempts
/// naturally. The attempt itself still counts.
pub fn apply_transport_failure(definition: &mut PushNotification) {
    definition.attempts += 1;
    definition.progress_id = DeliveryProgress::Error.id();
}

// ---------------------------------------------------------------------------
// IO shell
// ---------------------------------------------------------------------------

/// Run one dispatch pass for a single definition.
///
/// Makes at most one transport call and persists the definition
/// unconditionally at the end, whatever the transport did. Only a store
/// failure aborts the pass, dropping the definition's in-memory changes
/// with it.
pub async fn dispatch_one(
    pool: &PgPool,
    transport: &dyn PushTransport,
    definition: &mut PushNotification,
    reference_now: NaiveDateTime,
) -> Result<DispatchOutcome, sqlx::Error> {
    // Scope the thread-local rng so the future stays Send.
    {
        let mut rng = rand::rng();
        refresh_send_instant(definition, reference_now.date(), &mut rng);
    }

    let mut outcome = DispatchOutcome::default();

    let Some(target_ids) = resolve_targets(pool, definition).await? else {
        tracing::warn!(
            notification_id = definition.id,
            "No explicit targets and no audience, nothing to dispatch"
        );
        PushNotificationRepo::save(pool, definition).await?;
        return Ok(outcome);
    };

    let users = UserRepo::fetch_by_ids(pool, &target_ids).await?;
    let eligible = select_eligible(definition, &users, reference_now);

    if !eligible.is_empty() {
        let tokens: Vec<String> = eligible
            .iter()
            .filter_map(|user| user.device_token.clone())
            .collect();

        match transport
            .send_batch(&tokens, &definition.title, &definition.body)
            .await
        {
            Ok(batch) => {
                if !batch.failure_details.is_empty() {
                    tracing::warn!(
                        notification_id = definition.id,
                        details = ?batch.failure_details,
                        "Gateway rejected some devices"
                    );
                }
                apply_outcome(definition, &eligible, &batch, reference_now);
                outcome.delivered += batch.success;
                outcome.errors += batch.failure;
            }
            Err(e) => {
                tracing::error!(
                    notification_id = definition.id,
                    batch_size = tokens.len(),
                    error = %e,
                    "Batch send failed, no counts received"
                );
                apply_transport_failure(definition);
                outcome.errors += tokens.len() as i64;
            }
        }
    }

    PushNotificationRepo::save(pool, definition).await?;
    Ok(outcome)
}

/// Resolve the definition's recipient ids.
///
/// A non-empty explicit list wins; otherwise audience membership is
/// consulted. `None` means the definition has no way to name recipients at
/// all (an empty audience still resolves, to an empty set).
async fn resolve_targets(
    pool: &PgPool,
    definition: &PushNotification,
) -> Result<Option<Vec<DbId>>, sqlx::Error> {
    if !definition.target_user_ids.0.is_empty() {
        return Ok(Some(definition.target_user_ids.0.clone()));
    }
    match definition.audience_id {
        Some(audience_id) => Ok(Some(AudienceRepo::member_ids(pool, audience_id).await?)),
        None => Ok(None),
    }
}
