//! # SQLite Allowance Repository
//!
//! Timestamps are stored as RFC 3339 text, the frequency and currency as
//! their wire tags.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::db::DbConnection;
use crate::domain::models::Allowance;
use crate::storage::traits::AllowanceStorage;

const SELECT_COLUMNS: &str = "id, wallet, name, lightning_address, amount, currency, \
     frequency_type, start_date, end_date, next_payment_date, active";

#[derive(Clone)]
pub struct AllowanceRepository {
    db: DbConnection,
}

impl AllowanceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_allowance(row: &SqliteRow) -> Result<Allowance> {
        let id: String = row.try_get("id")?;
        let amount: i64 = row.try_get("amount")?;
        let frequency_type: String = row.try_get("frequency_type")?;
        let currency: String = row.try_get("currency")?;
        let end_date: Option<String> = row.try_get("end_date")?;

        // Parse tags and timestamps back into domain types
        Ok(Allowance {
            amount: u64::try_from(amount)
                .with_context(|| format!("Negative amount stored for allowance {}", id))?,
            frequency_type: frequency_type
                .parse()
                .with_context(|| format!("Bad frequency stored for allowance {}", id))?,
            currency: currency
                .parse()
                .with_context(|| format!("Bad currency stored for allowance {}", id))?,
            wallet: row.try_get("wallet")?,
            name: row.try_get("name")?,
            lightning_address: row.try_get("lightning_address")?,
            start_date: parse_stored_timestamp(&row.try_get::<String, _>("start_date")?)?,
            end_date: end_date.as_deref().map(parse_stored_timestamp).transpose()?,
            next_payment_date: parse_stored_timestamp(&row.try_get::<String, _>("next_payment_date")?)?,
            active: row.try_get("active")?,
            id: Some(id),
        })
    }
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn parse_stored_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Bad timestamp in database: '{}'", value))
}

fn stored_amount(allowance: &Allowance) -> Result<i64> {
    i64::try_from(allowance.amount).context("Allowance amount exceeds storage range")
}

#[async_trait]
impl AllowanceStorage for AllowanceRepository {
    async fn store_allowance(&self, allowance: &Allowance) -> Result<Allowance> {
        // Keep a caller-provided id, otherwise generate one
        let id = allowance.id.clone().unwrap_or_else(Allowance::generate_id);

        // Insert the allowance
        sqlx::query(
            r#"
            INSERT INTO allowances (id, wallet, name, lightning_address, amount, currency,
                frequency_type, start_date, end_date, next_payment_date, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&allowance.wallet)
        .bind(&allowance.name)
        .bind(&allowance.lightning_address)
        .bind(stored_amount(allowance)?)
        .bind(allowance.currency.to_string())
        .bind(allowance.frequency_type.to_string())
        .bind(format_timestamp(allowance.start_date))
        .bind(allowance.end_date.map(format_timestamp))
        .bind(format_timestamp(allowance.next_payment_date))
        .bind(allowance.active)
        .execute(self.db.pool())
        .await
        .context("Failed to insert allowance")?;

        debug!("Stored allowance {} for wallet {}", id, allowance.wallet);
        Ok(allowance.clone().with_id(id))
    }

    async fn get_allowance(&self, allowance_id: &str) -> Result<Option<Allowance>> {
        // Look up the allowance by id
        let query = format!("SELECT {} FROM allowances WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(allowance_id)
            .fetch_optional(self.db.pool())
            .await
            .context("Failed to load allowance")?;

        // Convert the row if one was found
        row.as_ref().map(Self::row_to_allowance).transpose()
    }

    async fn update_allowance(&self, allowance: &Allowance) -> Result<bool> {
        let id = allowance
            .id
            .as_deref()
            .context("Cannot update an allowance that has not been stored")?;

        // Overwrite every mutable column of the stored row
        let result = sqlx::query(
            r#"
            UPDATE allowances
            SET wallet = ?, name = ?, lightning_address = ?, amount = ?, currency = ?,
                frequency_type = ?, start_date = ?, end_date = ?, next_payment_date = ?, active = ?
            WHERE id = ?
            "#,
        )
        .bind(&allowance.wallet)
        .bind(&allowance.name)
        .bind(&allowance.lightning_address)
        .bind(stored_amount(allowance)?)
        .bind(allowance.currency.to_string())
        .bind(allowance.frequency_type.to_string())
        .bind(format_timestamp(allowance.start_date))
        .bind(allowance.end_date.map(format_timestamp))
        .bind(format_timestamp(allowance.next_payment_date))
        .bind(allowance.active)
        .bind(id)
        .execute(self.db.pool())
        .await
        .context("Failed to update allowance")?;

        // No affected row means the allowance was deleted in the meantime
        Ok(result.rows_affected() > 0)
    }

    async fn delete_allowance(&self, allowance_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM allowances WHERE id = ?")
            .bind(allowance_id)
            .execute(self.db.pool())
            .await
            .context("Failed to delete allowance")?;

        // False when there was nothing to delete
        Ok(result.rows_affected() > 0)
    }

    async fn list_allowances(&self, wallet_ids: &[String]) -> Result<Vec<Allowance>> {
        // A user without wallets has no allowances
        if wallet_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Bind one placeholder per wallet, in creation order
        let placeholders = vec!["?"; wallet_ids.len()].join(", ");
        let query = format!(
            "SELECT {} FROM allowances WHERE wallet IN ({}) ORDER BY rowid",
            SELECT_COLUMNS, placeholders
        );

        let mut statement = sqlx::query(&query);
        for wallet_id in wallet_ids {
            statement = statement.bind(wallet_id);
        }

        // Execute query and convert rows
        let rows = statement
            .fetch_all(self.db.pool())
            .await
            .context("Failed to list allowances")?;
        rows.iter().map(Self::row_to_allowance).collect()
    }

    async fn list_active_allowances(&self) -> Result<Vec<Allowance>> {
        // Soonest payment first so the scheduler pays in due order
        let query = format!(
            "SELECT {} FROM allowances WHERE active = 1 ORDER BY next_payment_date, rowid",
            SELECT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(self.db.pool())
            .await
            .context("Failed to list active allowances")?;
        rows.iter().map(Self::row_to_allowance).collect()
    }
}
