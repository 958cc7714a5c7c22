//! Client-side allowance form state.
//!
//! The form is a plain value: opening a dialog builds a fresh `AllowanceForm`
//! from either defaults or a persisted [`Allowance`], edits produce new
//! values, and submitting converts it into an [`AllowanceDraft`]. The
//! persisted record is never aliased by the form.
//!
//! Date inputs only show the calendar day, while stored dates carry a time
//! of day. An edit form therefore remembers the stored timestamps and leaves
//! untouched dates out of the draft, so saving a rename never moves the
//! schedule.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::{Allowance, AllowanceDraft};

/// Entry of the frequency picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyOption {
    pub label: &'static str,
    pub value: &'static str,
}

pub const FREQUENCY_OPTIONS: [FrequencyOption; 7] = [
    FrequencyOption { label: "Minutely", value: "minutely" },
    FrequencyOption { label: "Hourly", value: "hourly" },
    FrequencyOption { label: "Daily", value: "daily" },
    FrequencyOption { label: "Weekly", value: "weekly" },
    FrequencyOption { label: "Monthly", value: "monthly" },
    FrequencyOption { label: "Yearly", value: "yearly" },
    FrequencyOption { label: "Streaming (10s intervals)", value: "streaming-10" },
];

const DATE_INPUT_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AllowanceForm {
    /// Set when editing an existing allowance
    pub id: Option<String>,
    pub name: String,
    pub wallet: String,
    pub lightning_address: String,
    /// Raw text of the amount input
    pub amount: String,
    pub currency: String,
    pub frequency_type: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`, empty for "no end date"
    pub end_date: String,
    pub active: bool,
    /// Dates of the record being edited
    stored: Option<StoredDates>,
}

#[derive(Debug, Clone, PartialEq)]
struct StoredDates {
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
}

impl StoredDates {
    fn start_input(&self) -> String {
        date_input(&self.start_date)
    }

    fn end_input(&self) -> String {
        self.end_date.as_ref().map(date_input).unwrap_or_default()
    }
}

impl AllowanceForm {
    /// Form for a new allowance paid from `wallet_id`, starting `today`.
    pub fn open_create(wallet_id: &str, today: NaiveDate) -> Self {
        Self {
            wallet: wallet_id.to_string(),
            currency: "sats".to_string(),
            start_date: today.format(DATE_INPUT_FORMAT).to_string(),
            active: true,
            ..Self::default()
        }
    }

    /// Form pre-filled from a stored allowance. The stored `active` flag is
    /// kept as-is.
    pub fn open_edit(record: &Allowance) -> Self {
        let stored = StoredDates {
            start_date: record.start_date,
            end_date: record.end_date,
        };
        Self {
            id: Some(record.id.clone()),
            name: record.name.clone(),
            wallet: record.wallet.clone(),
            lightning_address: record.lightning_address.clone(),
            amount: record.amount.to_string(),
            currency: record.currency.clone(),
            frequency_type: record.frequency_type.clone(),
            start_date: stored.start_input(),
            end_date: stored.end_input(),
            active: record.active,
            stored: Some(stored),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn toggle_active(self) -> Self {
        Self {
            active: !self.active,
            ..self
        }
    }

    /// Convert the form into the request body sent to the API.
    ///
    /// Blank inputs are left out so the server reports them as missing.
    /// When editing, dates whose input still shows the stored day are left
    /// out so the stored timestamps stay exact, and a cleared end date is
    /// sent as an explicit `null`.
    pub fn to_draft(&self) -> AllowanceDraft {
        let (start_date, end_date) = match &self.stored {
            Some(stored) => {
                let start_date = if self.start_date.trim() == stored.start_input() {
                    None
                } else {
                    non_blank(&self.start_date)
                };
                let end_date = if self.end_date.trim() == stored.end_input() {
                    None
                } else {
                    Some(non_blank(&self.end_date))
                };
                (start_date, end_date)
            }
            None => (non_blank(&self.start_date), non_blank(&self.end_date).map(Some)),
        };

        AllowanceDraft {
            name: non_blank(&self.name),
            wallet: non_blank(&self.wallet),
            lightning_address: non_blank(&self.lightning_address),
            amount: non_blank(&self.amount).map(Value::String),
            currency: non_blank(&self.currency),
            frequency_type: non_blank(&self.frequency_type),
            start_date,
            end_date,
            active: Some(self.active),
        }
    }
}

fn date_input(date: &DateTime<Utc>) -> String {
    date.format(DATE_INPUT_FORMAT).to_string()
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
