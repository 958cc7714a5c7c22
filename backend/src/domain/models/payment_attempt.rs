//! Domain model for one scheduled payment attempt.
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Payment handed to the gateway, outcome not yet recorded
    Pending,
    Succeeded,
    Failed,
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::Pending => write!(f, "pending"),
            AttemptStatus::Succeeded => write!(f, "succeeded"),
            AttemptStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for AttemptStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(AttemptStatus::Pending),
            "succeeded" => Ok(AttemptStatus::Succeeded),
            "failed" => Ok(AttemptStatus::Failed),
            other => Err(anyhow::anyhow!("Unknown payment attempt status: {}", other)),
        }
    }
}

/// Outcome log entry keyed by allowance and the tick it pays for.
///
/// The tick is the `next_payment_date` the allowance had when the attempt
/// started, so a retry of the same tick finds the earlier entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub allowance_id: String,
    pub tick: DateTime<Utc>,
    pub status: AttemptStatus,
    pub attempts: u32,
    pub payment_hash: Option<String>,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentAttempt {
    pub fn pending(allowance_id: &str, tick: DateTime<Utc>, attempts: u32, now: DateTime<Utc>) -> Self {
        Self {
            allowance_id: allowance_id.to_string(),
            tick,
            status: AttemptStatus::Pending,
            attempts,
            payment_hash: None,
            error: None,
            updated_at: now,
        }
    }

    pub fn succeeded(self, payment_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            status: AttemptStatus::Succeeded,
            payment_hash: Some(payment_hash),
            error: None,
            updated_at: now,
            ..self
        }
    }

    pub fn failed(self, error: String, now: DateTime<Utc>) -> Self {
        Self {
            status: AttemptStatus::Failed,
            error: Some(error),
            updated_at: now,
            ..self
        }
    }
}
