//! Periodic dispatch cycle.
//!
//! [`CycleRunner`] runs as a background task. Each pass captures one
//! reference "now", walks every definition kind in a fixed order, dispatches
//! due batches, and logs a per-cycle summary. Totals are cycle-scoped;
//! nothing carries over between passes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use chime_core::recurrence::Recurrence;
use chime_db::repositories::PushNotificationRepo;
use chime_db::DbPool;

use crate::dispatcher;
use crate::transport::PushTransport;

/// How often a dispatch cycle runs by default.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(60);

/// Totals for one full dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Devices the gateway accepted messages for, across all definitions.
    pub delivered: i64,
    /// Devices that failed, across all definitions.
    pub errors: i64,
}

// ---------------------------------------------------------------------------
// CycleRunner
// ---------------------------------------------------------------------------

/// Background service that runs dispatch cycles on a fixed cadence.
pub struct CycleRunner {
    pool: DbPool,
    transport: Arc<dyn PushTransport>,
    interval: Duration,
}

impl CycleRunner {
    /// Create a runner with the default cadence.
    pub fn new(pool: DbPool, transport: Arc<dyn PushTransport>) -> Self {
        Self::with_interval(pool, transport, DEFAULT_CYCLE_INTERVAL)
    }

    /// Create a runner with a custom cadence.
    pub fn with_interval(
        pool: DbPool,
        transport: Arc<dyn PushTransport>,
        interval: Duration,
    ) -> Self {
        Self {
            pool,
            transport,
            interval,
        }
    }

    /// Run the dispatch loop.
    ///
    /// One cycle per tick. The loop exits gracefully when the provided
    /// [`CancellationToken`] is cancelled; an in-flight cycle finishes first.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Dispatch cycle runner cancelled");
                    break;
                }
                _ = interval.tick() => {
                    let summary = self.run_once().await;
                    if summary != CycleSummary::default() {
                        tracing::info!(
                            delivered = summary.delivered,
                            errors = summary.errors,
                            "Dispatch cycle complete"
                        );
                    }
                }
            }
        }
    }

    /// Run one full dispatch cycle.
    ///
    /// The reference instant is captured exactly once and shared read-only
    /// by every eligibility decision in the cycle. Kinds are processed in
    /// the fixed order SINGLE, DAILY, WEEKLY; a failure is contained to the
    /// definition (or, for a list failure, the kind) it occurred in.
    pub async fn run_once(&self) -> CycleSummary {
        let reference_now = Utc::now().naive_utc();
        let mut summary = CycleSummary::default();

        for recurrence in Recurrence::CYCLE_ORDER {
            let mut definitions =
                match PushNotificationRepo::list_by_recurrence(&self.pool, recurrence).await {
                    Ok(definitions) => definitions,
                    Err(e) => {
                        tracing::error!(
                            kind = recurrence.as_str(),
                            error = %e,
                            "Failed to list definitions, skipping kind"
                        );
                        continue;
                    }
                };

            for definition in &mut definitions {
                match dispatcher::dispatch_one(
                    &self.pool,
                    self.transport.as_ref(),
                    definition,
                    reference_now,
                )
                .await
                {
                    Ok(outcome) => {
                        summary.delivered += outcome.delivered;
                        summary.errors += outcome.errors;
                    }
                    Err(e) => {
                        tracing::error!(
                            notification_id = definition.id,
                            kind = recurrence.as_str(),
                            error = %e,
                            "Dispatch pass aborted, changes dropped"
                        );
                    }
                }
            }
        }

        summary
    }
}
