//! # SQLite Payment Attempt Repository
//!
//! One row per (allowance, tick). The scheduler consults it before paying
//! so a retried tick is never paid twice.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::allowance_repository::{format_timestamp, parse_stored_timestamp};
use super::db::DbConnection;
use crate::domain::models::PaymentAttempt;
use crate::storage::traits::PaymentAttemptStorage;

#[derive(Clone)]
pub struct PaymentAttemptRepository {
    db: DbConnection,
}

impl PaymentAttemptRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_attempt(row: &SqliteRow) -> Result<PaymentAttempt> {
        let status: String = row.try_get("status")?;
        let attempts: i64 = row.try_get("attempts")?;

        Ok(PaymentAttempt {
            allowance_id: row.try_get("allowance_id")?,
            tick: parse_stored_timestamp(&row.try_get::<String, _>("tick")?)?,
            status: status.parse()?,
            attempts: u32::try_from(attempts).context("Bad attempt count in database")?,
            payment_hash: row.try_get("payment_hash")?,
            error: row.try_get("error")?,
            updated_at: parse_stored_timestamp(&row.try_get::<String, _>("updated_at")?)?,
        })
    }
}

#[async_trait]
impl PaymentAttemptStorage for PaymentAttemptRepository {
    async fn find_attempt(&self, allowance_id: &str, tick: DateTime<Utc>) -> Result<Option<PaymentAttempt>> {
        let row = sqlx::query(
            r#"
            SELECT allowance_id, tick, status, attempts, payment_hash, error, updated_at
            FROM payment_attempts
            WHERE allowance_id = ? AND tick = ?
            "#,
        )
        .bind(allowance_id)
        .bind(format_timestamp(tick))
        .fetch_optional(self.db.pool())
        .await
        .context("Failed to load payment attempt")?;

        row.as_ref().map(Self::row_to_attempt).transpose()
    }

    async fn record_attempt(&self, attempt: &PaymentAttempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO payment_attempts
                (allowance_id, tick, status, attempts, payment_hash, error, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&attempt.allowance_id)
        .bind(format_timestamp(attempt.tick))
        .bind(attempt.status.to_string())
        .bind(i64::from(attempt.attempts))
        .bind(&attempt.payment_hash)
        .bind(&attempt.error)
        .bind(format_timestamp(attempt.updated_at))
        .execute(self.db.pool())
        .await
        .context("Failed to record payment attempt")?;
        Ok(())
    }

    async fn list_attempts(&self, allowance_id: &str) -> Result<Vec<PaymentAttempt>> {
        let rows = sqlx::query(
            r#"
            SELECT allowance_id, tick, status, attempts, payment_hash, error, updated_at
            FROM payment_attempts
            WHERE allowance_id = ?
            ORDER BY tick
            "#,
        )
        .bind(allowance_id)
        .fetch_all(self.db.pool())
        .await
        .context("Failed to list payment attempts")?;

        rows.iter().map(Self::row_to_attempt).collect()
    }
}
