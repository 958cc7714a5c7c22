//! # Storage Traits
//!
//! Storage abstractions used by the domain layer. The domain only sees these
//! traits; the SQLite implementations live in [`super::sqlite`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::{Allowance, PaymentAttempt};

/// Keyed collection of allowance records
#[async_trait]
pub trait AllowanceStorage: Send + Sync {
    /// Persist a new allowance, assigning its id. Returns the stored record.
    async fn store_allowance(&self, allowance: &Allowance) -> Result<Allowance>;

    /// Retrieve a specific allowance by id
    async fn get_allowance(&self, allowance_id: &str) -> Result<Option<Allowance>>;

    /// Overwrite an existing allowance.
    /// Returns false if no record with that id exists.
    async fn update_allowance(&self, allowance: &Allowance) -> Result<bool>;

    /// Hard delete. Returns true if a record was removed.
    async fn delete_allowance(&self, allowance_id: &str) -> Result<bool>;

    /// All allowances paid from any of `wallet_ids`, in creation order
    async fn list_allowances(&self, wallet_ids: &[String]) -> Result<Vec<Allowance>>;

    /// Every active allowance, for the payment scheduler
    async fn list_active_allowances(&self) -> Result<Vec<Allowance>>;
}

/// Outcome log of scheduled payment attempts
#[async_trait]
pub trait PaymentAttemptStorage: Send + Sync {
    /// Attempt recorded for this allowance and tick, if any
    async fn find_attempt(&self, allowance_id: &str, tick: DateTime<Utc>) -> Result<Option<PaymentAttempt>>;

    /// Insert or replace the attempt for its (allowance, tick) pair
    async fn record_attempt(&self, attempt: &PaymentAttempt) -> Result<()>;

    /// All attempts for an allowance, oldest tick first
    async fn list_attempts(&self, allowance_id: &str) -> Result<Vec<PaymentAttempt>>;
}
