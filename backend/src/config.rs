//! # Configuration
//!
//! Server settings are read from a YAML file whose path is taken from
//! `ALLOWANCE_CONFIG` (default `allowance.yaml`). A missing file yields the
//! defaults. `ALLOWANCE_BIND_ADDRESS` and `ALLOWANCE_DATABASE_URL` override
//! the corresponding file values.
//!
//! ```yaml
//! bind_address: 0.0.0.0:3000
//! database_url: sqlite:/var/lib/allowance/allowance.db
//! cors_origin: http://localhost:8080
//! wallets:
//!   - wallet_id: w1
//!     user_id: u1
//!     admin_key: 0f3a...
//!     invoice_key: 9b1c...
//! scheduler:
//!   enabled: true
//!   poll_interval_secs: 10
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::payment_scheduler::DEFAULT_MAX_ATTEMPTS;
use crate::domain::wallet_keys::StaticWalletKeys;
use crate::storage::sqlite::db::DEFAULT_DATABASE_URL;

pub const CONFIG_PATH_ENV: &str = "ALLOWANCE_CONFIG";
pub const BIND_ADDRESS_ENV: &str = "ALLOWANCE_BIND_ADDRESS";
pub const DATABASE_URL_ENV: &str = "ALLOWANCE_DATABASE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "allowance.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: String,
    /// Allowed browser origin; any origin when unset
    pub cors_origin: Option<String>,
    pub wallets: Vec<WalletConfig>,
    pub scheduler: SchedulerConfig,
}

/// Keys of one wallet, as issued by the wallet system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    pub wallet_id: String,
    pub user_id: String,
    pub admin_key: String,
    pub invoice_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    /// Gateway calls per tick before the tick is abandoned
    pub max_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            cors_origin: None,
            wallets: Vec::new(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_secs: 10,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AppConfig {
    /// Load from the file named by `ALLOWANCE_CONFIG` and apply environment
    /// overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = Self::load_from(&path)?;
        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let yaml_content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&yaml_content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        info!(
            "Loaded config from {} ({} wallets)",
            path.display(),
            config.wallets.len()
        );
        Ok(config)
    }

    /// Apply `ALLOWANCE_*` overrides looked up through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind_address) = lookup(BIND_ADDRESS_ENV).filter(|v| !v.trim().is_empty()) {
            self.bind_address = bind_address;
        }
        if let Some(database_url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.database_url = database_url;
        }
        self
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))
    }

    pub fn wallet_keys(&self) -> StaticWalletKeys {
        self.wallets.iter().fold(StaticWalletKeys::new(), |keys, wallet| {
            keys.with_wallet(
                &wallet.wallet_id,
                &wallet.user_id,
                &wallet.admin_key,
                &wallet.invoice_key,
            )
        })
    }
}

impl SchedulerConfig {
    /// Never zero; `tokio::time::interval` rejects a zero period
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
