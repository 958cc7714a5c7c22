//! # Payment Scheduler
//!
//! Periodically pays every allowance whose `next_payment_date` has passed and
//! moves its schedule forward.
//!
//! Per record and tick the scheduler guarantees at most one payment:
//!
//! - A record whose lock is held (an API write or another scheduler pass)
//!   is skipped until the next poll.
//! - The record is re-read under the lock, so a concurrent pause or edit is
//!   honoured.
//! - Every attempt is logged under (allowance id, tick) before the gateway is
//!   called. A tick with a `succeeded` or `pending` entry is never paid again.
//! - After a successful payment the rolled-forward schedule is persisted
//!   before the attempt is marked `succeeded`.
//!
//! Failed payments are retried on later polls until `max_attempts` is
//! reached, after which the tick is abandoned and the schedule moves on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::errors::AllowanceError;
use crate::domain::models::{Allowance, AttemptStatus, PaymentAttempt};
use crate::domain::record_locks::RecordLocks;
use crate::domain::schedule::{is_due, roll_forward, state, ScheduleState};
use crate::storage::{
    AllowanceRepository, AllowanceStorage, DbConnection, PaymentAttemptRepository,
    PaymentAttemptStorage,
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Proof of a completed payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment_hash: String,
}

/// Executes the actual transfer to the recipient's Lightning address
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn pay(&self, allowance: &Allowance, tick: DateTime<Utc>) -> anyhow::Result<PaymentReceipt>;
}

/// Logs the payment it would make and reports success
#[derive(Debug, Clone, Default)]
pub struct DryRunGateway;

#[async_trait]
impl PaymentGateway for DryRunGateway {
    async fn pay(&self, allowance: &Allowance, tick: DateTime<Utc>) -> anyhow::Result<PaymentReceipt> {
        info!(
            "[dry-run] paying {} {} from wallet {} to {} for tick {}",
            allowance.amount,
            allowance.currency,
            allowance.wallet,
            allowance.lightning_address,
            tick
        );
        Ok(PaymentReceipt {
            payment_hash: format!("dry-run-{}-{}", allowance.display_id(), tick.timestamp()),
        })
    }
}

/// Counters for one scheduler pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Due or expired records processed under their lock
    pub examined: usize,
    pub paid: usize,
    pub failed: usize,
    /// Due records skipped because their lock was held
    pub skipped_busy: usize,
    /// Records switched off because their schedule ran past `end_date`
    pub expired: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Paid,
    Failed,
    Expired,
    Skipped,
}

#[derive(Clone)]
pub struct PaymentScheduler {
    allowances: Arc<dyn AllowanceStorage>,
    attempts: Arc<dyn PaymentAttemptStorage>,
    gateway: Arc<dyn PaymentGateway>,
    locks: RecordLocks,
    max_attempts: u32,
}

impl PaymentScheduler {
    pub fn new(db: Arc<DbConnection>, gateway: Arc<dyn PaymentGateway>, locks: RecordLocks) -> Self {
        Self::with_storage(
            Arc::new(AllowanceRepository::new((*db).clone())),
            Arc::new(PaymentAttemptRepository::new((*db).clone())),
            gateway,
            locks,
        )
    }

    pub fn with_storage(
        allowances: Arc<dyn AllowanceStorage>,
        attempts: Arc<dyn PaymentAttemptStorage>,
        gateway: Arc<dyn PaymentGateway>,
        locks: RecordLocks,
    ) -> Self {
        Self {
            allowances,
            attempts,
            gateway,
            locks,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..self
        }
    }

    /// Process every active allowance that is due (or has expired) at `now`.
    ///
    /// Only a failure to list the active allowances aborts the pass; errors
    /// on individual records are logged and counted as failures.
    pub async fn run_due(&self, now: DateTime<Utc>) -> Result<TickReport, AllowanceError> {
        let candidates = self
            .allowances
            .list_active_allowances()
            .await
            .map_err(AllowanceError::store)?;

        let mut report = TickReport::default();
        for candidate in candidates {
            if !matches!(state(&candidate, now), ScheduleState::Due | ScheduleState::Expired) {
                continue;
            }
            let Some(allowance_id) = candidate.id.clone() else {
                continue;
            };

            let Some(_guard) = self.locks.try_lock(&allowance_id) else {
                debug!("Allowance {} is busy, skipping this pass", allowance_id);
                report.skipped_busy += 1;
                continue;
            };
            report.examined += 1;

            match self.process(&allowance_id, now).await {
                Ok(Outcome::Paid) => report.paid += 1,
                Ok(Outcome::Failed) => report.failed += 1,
                Ok(Outcome::Expired) => report.expired += 1,
                Ok(Outcome::Skipped) => {}
                Err(e) => {
                    error!("Failed to process allowance {}: {}", allowance_id, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Run `run_due` every `poll_interval` until the task is aborted
    pub fn spawn(self, poll_interval: Duration) -> JoinHandle<()> {
        info!("Payment scheduler polling every {:?}", poll_interval);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match self.run_due(Utc::now()).await {
                    Ok(report) if report != TickReport::default() => {
                        info!("Scheduler pass: {:?}", report);
                    }
                    Ok(_) => {}
                    Err(e) => error!("Scheduler pass failed: {}", e),
                }
            }
        })
    }

    async fn process(&self, allowance_id: &str, now: DateTime<Utc>) -> Result<Outcome, AllowanceError> {
        let record = match self
            .allowances
            .get_allowance(allowance_id)
            .await
            .map_err(AllowanceError::store)?
        {
            Some(record) if record.active => record,
            _ => return Ok(Outcome::Skipped),
        };

        if !is_due(&record, now) {
            if state(&record, now) == ScheduleState::Expired {
                self.advance(&record, now).await?;
                info!("Allowance {} reached its end date, deactivated", allowance_id);
                return Ok(Outcome::Expired);
            }
            return Ok(Outcome::Skipped);
        }

        let tick = record.next_payment_date;
        let previous = self
            .attempts
            .find_attempt(allowance_id, tick)
            .await
            .map_err(AllowanceError::store)?;

        let attempt_number = match previous {
            Some(attempt) if attempt.status == AttemptStatus::Succeeded => {
                info!("Tick {} of allowance {} already paid", tick, allowance_id);
                self.advance(&record, now).await?;
                return Ok(Outcome::Skipped);
            }
            Some(attempt) if attempt.status == AttemptStatus::Pending => {
                warn!(
                    "Tick {} of allowance {} has an unfinished attempt, not paying again",
                    tick, allowance_id
                );
                self.advance(&record, now).await?;
                return Ok(Outcome::Skipped);
            }
            Some(attempt) if attempt.attempts >= self.max_attempts => {
                warn!(
                    "Giving up on tick {} of allowance {} after {} attempts",
                    tick, allowance_id, attempt.attempts
                );
                self.advance(&record, now).await?;
                return Ok(Outcome::Skipped);
            }
            Some(attempt) => attempt.attempts + 1,
            None => 1,
        };

        let pending = PaymentAttempt::pending(allowance_id, tick, attempt_number, now);
        self.record(&pending).await?;

        match self.gateway.pay(&record, tick).await {
            Ok(receipt) => {
                self.advance(&record, now).await?;
                self.record(&pending.succeeded(receipt.payment_hash, now)).await?;
                info!(
                    "Paid {} {} for allowance {} (tick {})",
                    record.amount, record.currency, allowance_id, tick
                );
                Ok(Outcome::Paid)
            }
            Err(e) => {
                warn!(
                    "Payment for allowance {} (tick {}, attempt {}) failed: {:#}",
                    allowance_id, tick, attempt_number, e
                );
                self.record(&pending.failed(format!("{:#}", e), now)).await?;
                if attempt_number >= self.max_attempts {
                    self.advance(&record, now).await?;
                }
                Ok(Outcome::Failed)
            }
        }
    }

    async fn advance(&self, record: &Allowance, now: DateTime<Utc>) -> Result<Allowance, AllowanceError> {
        let rolled = roll_forward(record, now)?;
        self.allowances
            .update_allowance(&rolled)
            .await
            .map_err(AllowanceError::store)?;
        Ok(rolled)
    }

    async fn record(&self, attempt: &PaymentAttempt) -> Result<(), AllowanceError> {
        self.attempts
            .record_attempt(attempt)
            .await
            .map_err(AllowanceError::store)
    }
}
