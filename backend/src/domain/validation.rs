//! # Allowance draft validation
//!
//! Turns an untyped [`AllowanceDraft`] into a typed [`Allowance`]. Checks run
//! in a fixed order so the first reported error is deterministic:
//!
//! 1. `name`
//! 2. `wallet` (present, then owned by the caller)
//! 3. `lightning_address`
//! 4. `amount`
//! 5. `frequency_type`
//! 6. `currency`
//! 7. `start_date` (defaults to now)
//! 8. `end_date` (must not precede `start_date`)
//!
//! Everything here is pure: no store access, no clock reads.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use shared::AllowanceDraft;

use super::errors::AllowanceError;
use super::frequency::Frequency;
use super::models::{Allowance, Currency};
use super::schedule::compute_initial_next;
use super::wallet_keys::WalletAccess;

/// Amounts are persisted as signed 64-bit integers
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Validate a create request and compute its first payment date.
pub fn validate_draft(
    draft: &AllowanceDraft,
    caller: &WalletAccess,
    now: DateTime<Utc>,
) -> Result<Allowance, AllowanceError> {
    let name = required_text(draft.name.as_deref(), "name")?;

    let wallet = required_text(draft.wallet.as_deref(), "wallet")?;
    if !caller.can_manage(&wallet) {
        return Err(AllowanceError::UnauthorizedWallet);
    }

    let lightning_address = required_text(draft.lightning_address.as_deref(), "lightning_address")?;
    let amount = parse_amount(draft.amount.as_ref())?;
    let frequency_type = parse_frequency(draft.frequency_type.as_deref())?;

    let currency = match non_blank(draft.currency.as_deref()) {
        Some(raw) => raw.parse::<Currency>()?,
        None => Currency::Sats,
    };

    let start_date = match non_blank(draft.start_date.as_deref()) {
        Some(raw) => parse_timestamp("start_date", raw)?,
        None => now,
    };

    let end_date = match non_blank(draft.end_date.as_ref().and_then(|d| d.as_deref())) {
        Some(raw) => Some(parse_timestamp("end_date", raw)?),
        None => None,
    };
    if end_date.map_or(false, |end| end < start_date) {
        return Err(AllowanceError::InvalidDateRange);
    }

    let record = Allowance {
        id: None,
        name,
        wallet,
        lightning_address,
        amount,
        currency,
        frequency_type,
        start_date,
        end_date,
        next_payment_date: start_date,
        active: draft.active.unwrap_or(true),
    };
    let next_payment_date = compute_initial_next(&record)?;

    Ok(Allowance {
        next_payment_date,
        ..record
    })
}

/// Check only the fields a patch supplies.
///
/// Runs before the stored record is loaded so malformed updates never
/// reach the store.
pub fn check_patch(patch: &AllowanceDraft) -> Result<(), AllowanceError> {
    if let Some(name) = patch.name.as_deref() {
        required_text(Some(name), "name")?;
    }
    if let Some(wallet) = patch.wallet.as_deref() {
        required_text(Some(wallet), "wallet")?;
    }
    if let Some(address) = patch.lightning_address.as_deref() {
        required_text(Some(address), "lightning_address")?;
    }
    if patch.amount.is_some() {
        parse_amount(patch.amount.as_ref())?;
    }
    if patch.frequency_type.is_some() {
        parse_frequency(patch.frequency_type.as_deref())?;
    }
    if let Some(raw) = non_blank(patch.currency.as_deref()) {
        raw.parse::<Currency>()?;
    }
    if let Some(raw) = non_blank(patch.start_date.as_deref()) {
        parse_timestamp("start_date", raw)?;
    }
    if let Some(raw) = non_blank(patch.end_date.as_ref().and_then(|d| d.as_deref())) {
        parse_timestamp("end_date", raw)?;
    }
    Ok(())
}

/// Merge `patch` over `existing` and validate the result.
///
/// `next_payment_date` is recomputed only when the start date or the
/// frequency changed. The stored `active` flag survives unless the patch
/// sets it.
pub fn apply_patch(
    existing: &Allowance,
    patch: &AllowanceDraft,
    caller: &WalletAccess,
    now: DateTime<Utc>,
) -> Result<Allowance, AllowanceError> {
    let end_date = match &patch.end_date {
        Some(explicit) => explicit.clone(),
        None => existing.end_date.map(|d| d.to_rfc3339()),
    };

    let merged = AllowanceDraft {
        name: patch.name.clone().or_else(|| Some(existing.name.clone())),
        wallet: patch.wallet.clone().or_else(|| Some(existing.wallet.clone())),
        lightning_address: patch
            .lightning_address
            .clone()
            .or_else(|| Some(existing.lightning_address.clone())),
        amount: patch.amount.clone().or_else(|| Some(Value::from(existing.amount))),
        currency: non_blank(patch.currency.as_deref())
            .map(str::to_string)
            .or_else(|| Some(existing.currency.to_string())),
        frequency_type: patch
            .frequency_type
            .clone()
            .or_else(|| Some(existing.frequency_type.to_string())),
        start_date: non_blank(patch.start_date.as_deref())
            .map(str::to_string)
            .or_else(|| Some(existing.start_date.to_rfc3339())),
        end_date: Some(end_date),
        active: patch.active.or(Some(existing.active)),
    };

    let candidate = validate_draft(&merged, caller, now)?;
    let schedule_changed = candidate.start_date != existing.start_date
        || candidate.frequency_type != existing.frequency_type;

    Ok(Allowance {
        id: existing.id.clone(),
        next_payment_date: if schedule_changed {
            candidate.next_payment_date
        } else {
            existing.next_payment_date
        },
        ..candidate
    })
}

/// Parse the date formats emitted by the allowance forms and scripts:
/// RFC 3339, naive ISO-8601 (taken as UTC) and `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<DateTime<Utc>, AllowanceError> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| AllowanceError::InvalidDate {
            field,
            value: raw.to_string(),
        })
}

fn required_text(value: Option<&str>, field: &'static str) -> Result<String, AllowanceError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or(AllowanceError::MissingField(field))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_amount(value: Option<&Value>) -> Result<u64, AllowanceError> {
    let amount = match value {
        Some(Value::Number(number)) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= MAX_AMOUNT as f64)
                .map(|f| f as u64)
        }),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };

    match amount {
        Some(amount) if amount > 0 && amount <= MAX_AMOUNT => Ok(amount),
        _ => Err(AllowanceError::InvalidAmount),
    }
}

fn parse_frequency(value: Option<&str>) -> Result<Frequency, AllowanceError> {
    match value {
        Some(tag) => tag.parse(),
        None => Err(AllowanceError::InvalidFrequency(String::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wallet_keys::KeyScope;
    use serde_json::json;

    fn owner() -> WalletAccess {
        WalletAccess {
            wallet_id: "w1".to_string(),
            user_id: "alice".to_string(),
            scope: KeyScope::Admin,
            user_wallet_ids: vec!["w1".to_string(), "w2".to_string()],
        }
    }

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn pocket_money() -> AllowanceDraft {
        AllowanceDraft {
            name: Some("Pocket money".to_string()),
            wallet: Some("w1".to_string()),
            lightning_address: Some("a@b.com".to_string()),
            amount: Some(json!(100)),
            currency: Some("sats".to_string()),
            frequency_type: Some("weekly".to_string()),
            start_date: Some("2024-01-01T00:00:00Z".to_string()),
            end_date: None,
            active: None,
        }
    }

    #[test]
    fn test_pocket_money_scenario() {
        let record = validate_draft(&pocket_money(), &owner(), utc(2023, 12, 1)).unwrap();

        assert_eq!(record.id, None);
        assert_eq!(record.next_payment_date, utc(2024, 1, 8));
        assert!(record.active);
        assert_eq!(record.currency, Currency::Sats);
        assert_eq!(record.frequency_type, Frequency::Weekly);
    }

    #[test]
    fn test_missing_name_reported_before_amount() {
        let draft = AllowanceDraft {
            name: None,
            amount: None,
            ..pocket_money()
        };
        assert_eq!(
            validate_draft(&draft, &owner(), utc(2024, 1, 1)),
            Err(AllowanceError::MissingField("name"))
        );
    }

    #[test]
    fn test_check_order() {
        let now = utc(2024, 1, 1);
        let cases = [
            (
                AllowanceDraft { name: Some("   ".to_string()), ..pocket_money() },
                AllowanceError::MissingField("name"),
            ),
            (
                AllowanceDraft { wallet: None, lightning_address: None, ..pocket_money() },
                AllowanceError::MissingField("wallet"),
            ),
            (
                AllowanceDraft { wallet: Some("w2".to_string()), amount: None, ..pocket_money() },
                AllowanceError::UnauthorizedWallet,
            ),
            (
                AllowanceDraft { lightning_address: Some(String::new()), amount: Some(json!(0)), ..pocket_money() },
                AllowanceError::MissingField("lightning_address"),
            ),
            (
                AllowanceDraft { amount: Some(json!(-5)), frequency_type: None, ..pocket_money() },
                AllowanceError::InvalidAmount,
            ),
            (
                AllowanceDraft { frequency_type: None, currency: Some("???".to_string()), ..pocket_money() },
                AllowanceError::InvalidFrequency(String::new()),
            ),
            (
                AllowanceDraft { currency: Some("dollars".to_string()), start_date: Some("bad".to_string()), ..pocket_money() },
                AllowanceError::InvalidCurrency("dollars".to_string()),
            ),
            (
                AllowanceDraft { start_date: Some("yesterday".to_string()), ..pocket_money() },
                AllowanceError::InvalidDate { field: "start_date", value: "yesterday".to_string() },
            ),
            (
                AllowanceDraft { end_date: Some(Some("2023-12-31".to_string())), ..pocket_money() },
                AllowanceError::InvalidDateRange,
            ),
        ];

        for (draft, expected) in cases {
            assert_eq!(validate_draft(&draft, &owner(), now), Err(expected));
        }
    }

    #[test]
    fn test_unknown_frequency_never_defaults_to_weekly() {
        let draft = AllowanceDraft {
            frequency_type: Some("fortnightly".to_string()),
            ..pocket_money()
        };
        assert_eq!(
            validate_draft(&draft, &owner(), utc(2024, 1, 1)),
            Err(AllowanceError::InvalidFrequency("fortnightly".to_string()))
        );
    }

    #[test]
    fn test_amount_forms() {
        let now = utc(2024, 1, 1);
        for (amount, expected) in [
            (json!(250), Ok(250)),
            (json!("250"), Ok(250)),
            (json!(" 42 "), Ok(42)),
            (json!(10.0), Ok(10)),
            (json!(10.5), Err(AllowanceError::InvalidAmount)),
            (json!(0), Err(AllowanceError::InvalidAmount)),
            (json!("abc"), Err(AllowanceError::InvalidAmount)),
            (json!(true), Err(AllowanceError::InvalidAmount)),
            (json!(u64::MAX), Err(AllowanceError::InvalidAmount)),
        ] {
            let draft = AllowanceDraft {
                amount: Some(amount.clone()),
                ..pocket_money()
            };
            let result = validate_draft(&draft, &owner(), now).map(|r| r.amount);
            assert_eq!(result, expected, "amount {}", amount);
        }
    }

    #[test]
    fn test_start_date_defaults_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let draft = AllowanceDraft {
            start_date: None,
            frequency_type: Some("daily".to_string()),
            ..pocket_money()
        };
        let record = validate_draft(&draft, &owner(), now).unwrap();
        assert_eq!(record.start_date, now);
        assert_eq!(record.next_payment_date, Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_accepted_date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for raw in [
            "2024-01-01",
            "2024-01-01T00:00:00",
            "2024-01-01T00:00:00.000",
            "2024-01-01 00:00:00",
            "2024-01-01T00:00",
            "2024-01-01T00:00:00Z",
            "2024-01-01T01:00:00+01:00",
        ] {
            assert_eq!(parse_timestamp("start_date", raw).unwrap(), expected, "{}", raw);
        }
    }

    #[test]
    fn test_end_date_equal_to_start_is_allowed() {
        let draft = AllowanceDraft {
            end_date: Some(Some("2024-01-01".to_string())),
            ..pocket_money()
        };
        let record = validate_draft(&draft, &owner(), utc(2024, 1, 1)).unwrap();
        assert_eq!(record.end_date, Some(utc(2024, 1, 1)));
    }

    #[test]
    fn test_monthly_leap_year_scenario() {
        let draft = AllowanceDraft {
            frequency_type: Some("monthly".to_string()),
            start_date: Some("2024-01-31T00:00:00Z".to_string()),
            ..pocket_money()
        };
        let record = validate_draft(&draft, &owner(), utc(2024, 1, 1)).unwrap();
        assert_eq!(record.next_payment_date, utc(2024, 2, 29));
    }

    fn stored() -> Allowance {
        validate_draft(&pocket_money(), &owner(), utc(2024, 1, 1))
            .unwrap()
            .with_id("a1".to_string())
    }

    #[test]
    fn test_patch_without_schedule_change_keeps_next_payment() {
        let existing = Allowance {
            next_payment_date: utc(2024, 1, 22),
            ..stored()
        };
        let patch = AllowanceDraft {
            amount: Some(json!(500)),
            name: Some("Bigger allowance".to_string()),
            ..AllowanceDraft::default()
        };

        let updated = apply_patch(&existing, &patch, &owner(), utc(2024, 1, 20)).unwrap();
        assert_eq!(updated.id.as_deref(), Some("a1"));
        assert_eq!(updated.amount, 500);
        assert_eq!(updated.name, "Bigger allowance");
        assert_eq!(updated.next_payment_date, utc(2024, 1, 22));
    }

    #[test]
    fn test_patch_frequency_change_recomputes_next_payment() {
        let patch = AllowanceDraft {
            frequency_type: Some("daily".to_string()),
            ..AllowanceDraft::default()
        };
        let updated = apply_patch(&stored(), &patch, &owner(), utc(2024, 1, 1)).unwrap();
        assert_eq!(updated.frequency_type, Frequency::Daily);
        assert_eq!(updated.next_payment_date, utc(2024, 1, 2));
    }

    #[test]
    fn test_patch_start_date_change_recomputes_next_payment() {
        let patch = AllowanceDraft {
            start_date: Some("2024-02-01".to_string()),
            ..AllowanceDraft::default()
        };
        let updated = apply_patch(&stored(), &patch, &owner(), utc(2024, 1, 1)).unwrap();
        assert_eq!(updated.next_payment_date, utc(2024, 2, 8));
    }

    #[test]
    fn test_patch_preserves_stored_active_flag() {
        let paused = Allowance {
            active: false,
            ..stored()
        };
        let patch = AllowanceDraft {
            name: Some("Renamed".to_string()),
            ..AllowanceDraft::default()
        };
        let updated = apply_patch(&paused, &patch, &owner(), utc(2024, 1, 1)).unwrap();
        assert!(!updated.active);

        let resume = AllowanceDraft {
            active: Some(true),
            ..AllowanceDraft::default()
        };
        assert!(apply_patch(&paused, &resume, &owner(), utc(2024, 1, 1)).unwrap().active);
    }

    #[test]
    fn test_patch_end_date_set_and_clear() {
        let with_end = AllowanceDraft {
            end_date: Some(Some("2024-03-01".to_string())),
            ..AllowanceDraft::default()
        };
        let updated = apply_patch(&stored(), &with_end, &owner(), utc(2024, 1, 1)).unwrap();
        assert_eq!(updated.end_date, Some(utc(2024, 3, 1)));

        let clear = AllowanceDraft {
            end_date: Some(None),
            ..AllowanceDraft::default()
        };
        let cleared = apply_patch(&updated, &clear, &owner(), utc(2024, 1, 1)).unwrap();
        assert_eq!(cleared.end_date, None);

        let keep = apply_patch(&updated, &AllowanceDraft::default(), &owner(), utc(2024, 1, 1)).unwrap();
        assert_eq!(keep.end_date, Some(utc(2024, 3, 1)));
    }

    #[test]
    fn test_patch_end_date_before_start_rejected() {
        let patch = AllowanceDraft {
            end_date: Some(Some("2023-06-01".to_string())),
            ..AllowanceDraft::default()
        };
        assert_eq!(
            apply_patch(&stored(), &patch, &owner(), utc(2024, 1, 1)),
            Err(AllowanceError::InvalidDateRange)
        );
    }

    #[test]
    fn test_check_patch_rejects_bad_fields_only_when_present() {
        assert!(check_patch(&AllowanceDraft::default()).is_ok());
        assert_eq!(
            check_patch(&AllowanceDraft {
                name: Some(String::new()),
                frequency_type: Some("fortnightly".to_string()),
                ..AllowanceDraft::default()
            }),
            Err(AllowanceError::MissingField("name"))
        );
        assert_eq!(
            check_patch(&AllowanceDraft {
                frequency_type: Some("fortnightly".to_string()),
                ..AllowanceDraft::default()
            }),
            Err(AllowanceError::InvalidFrequency("fortnightly".to_string()))
        );
        assert_eq!(
            check_patch(&AllowanceDraft {
                amount: Some(json!(0)),
                ..AllowanceDraft::default()
            }),
            Err(AllowanceError::InvalidAmount)
        );
    }
}
