//! Domain model for a recurring allowance.
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::AllowanceError;
use crate::domain::frequency::Frequency;

/// Unit the allowance amount is denominated in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Currency {
    #[default]
    Sats,
    /// ISO 4217 code, stored upper-case (e.g. "USD")
    Fiat(String),
}

impl FromStr for Currency {
    type Err = AllowanceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("sats") || trimmed.eq_ignore_ascii_case("sat") {
            return Ok(Currency::Sats);
        }
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Ok(Currency::Fiat(trimmed.to_ascii_uppercase()));
        }
        Err(AllowanceError::InvalidCurrency(value.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Sats => write!(f, "sats"),
            Currency::Fiat(code) => write!(f, "{}", code),
        }
    }
}

/// One recurring payment intent.
///
/// `id` is `None` until the record has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allowance {
    pub id: Option<String>,
    pub name: String,
    pub wallet: String,
    pub lightning_address: String,
    pub amount: u64,
    pub currency: Currency,
    pub frequency_type: Frequency,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub next_payment_date: DateTime<Utc>,
    pub active: bool,
}

impl Allowance {
    /// Generate a 22 character url-safe identifier
    pub fn generate_id() -> String {
        URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
    }

    pub fn with_id(self, id: String) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Id for log lines; unsaved records show as "<new>"
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<new>")
    }
}
