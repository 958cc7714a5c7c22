use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub mod form;

pub use form::{AllowanceForm, FrequencyOption, FREQUENCY_OPTIONS};

/// Allowance record as it travels over the wire.
///
/// Field names match the LNbits extension contract exactly; `end_date` is
/// always present and serialised as `null` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allowance {
    pub id: String,
    /// Human readable description of the allowance
    pub name: String,
    /// Wallet the allowance is paid from
    pub wallet: String,
    /// Recipient Lightning address or LNURL
    pub lightning_address: String,
    /// Amount per payment, denominated in `currency`
    pub amount: u64,
    pub currency: String,
    /// Frequency tag, e.g. "weekly" or "streaming-10"
    pub frequency_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// Derived by the scheduler, never edited directly
    pub next_payment_date: DateTime<Utc>,
    pub active: bool,
}

/// Untyped allowance draft as submitted by a form or script.
///
/// Used as the body of both create (POST) and update (PUT) requests. On
/// update every absent field keeps its stored value; `end_date: null`
/// clears the end date. Unknown keys such as `id`, `memo` or
/// `next_payment_date` are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowanceDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightning_address: Option<String>,
    /// Number or numeric string; validated as a positive integer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_type: Option<String>,
    /// RFC 3339, naive ISO-8601 (UTC assumed) or `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// `None` = not supplied, `Some(None)` = explicitly null
    #[serde(
        default,
        deserialize_with = "deserialize_explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

fn deserialize_explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Body returned by a successful delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteAllowanceResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
