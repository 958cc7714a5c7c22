use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Used when no database url is configured
pub const DEFAULT_DATABASE_URL: &str = "sqlite:allowance.db";

/// DbConnection manages the SQLite pool and schema
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Open (creating if needed) the database at `url` and set up the schema
    pub async fn new(url: &str) -> Result<Self> {
        // Create database if it doesn't exist
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database url '{}'", url))?
            .create_if_missing(true);

        // Connect to the database
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database '{}'", url))?;

        // Setup database schema
        Self::setup_schema(&pool).await?;
        info!("Database ready at {}", url);

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Private in-memory database for tests.
    ///
    /// A single long-lived connection keeps the in-memory database alive for
    /// the lifetime of the pool.
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::setup_schema(&pool).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        // Create allowances table
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS allowances (
                id TEXT PRIMARY KEY,
                wallet TEXT NOT NULL,
                name TEXT NOT NULL,
                lightning_address TEXT NOT NULL,
                amount INTEGER NOT NULL,
                currency TEXT NOT NULL DEFAULT 'sats',
                frequency_type TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT,
                next_payment_date TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(pool)
        .await?;

        // Create index for listing a user's allowances by wallet
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_allowances_wallet
            ON allowances(wallet);
            "#,
        )
        .execute(pool)
        .await?;

        // Create payment attempts table, one row per allowance and due tick
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payment_attempts (
                allowance_id TEXT NOT NULL,
                tick TEXT NOT NULL,
                status TEXT NOT NULL,
                attempts INTEGER NOT NULL,
                payment_hash TEXT,
                error TEXT,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (allowance_id, tick)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
