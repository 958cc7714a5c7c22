//! # Schedule Calculator
//!
//! Derives `next_payment_date`, decides whether an allowance is due at a
//! given instant and moves the schedule forward after a payment.
//!
//! Missed ticks collapse: rolling forward after an outage yields the first
//! tick strictly after `now`, never a backlog of catch-up payments. Once the
//! next tick lies beyond `end_date` the allowance is switched off for good;
//! only changing `end_date` (and re-enabling it) brings it back.

use chrono::{DateTime, Duration, Utc};

use super::errors::AllowanceError;
use super::frequency::{advance, Frequency};
use super::models::Allowance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    /// Active, next tick in the future
    Scheduled,
    /// Active and a payment should be triggered now
    Due,
    /// Switched off by the owner
    Paused,
    /// No tick left before `end_date`
    Expired,
}

/// First payment date of a freshly created allowance
pub fn compute_initial_next(record: &Allowance) -> Result<DateTime<Utc>, AllowanceError> {
    advance(record.start_date, record.frequency_type)
}

pub fn is_due(record: &Allowance, now: DateTime<Utc>) -> bool {
    record.active
        && now >= record.next_payment_date
        && record.end_date.map_or(true, |end| now <= end)
}

/// Move the schedule past `now`.
///
/// Inactive records are returned unchanged. A record whose pending tick
/// already lies beyond `end_date` is deactivated.
pub fn roll_forward(record: &Allowance, now: DateTime<Utc>) -> Result<Allowance, AllowanceError> {
    if !record.active {
        return Ok(record.clone());
    }

    if past_end(record.next_payment_date, record.end_date) {
        return Ok(Allowance {
            active: false,
            ..record.clone()
        });
    }

    if now < record.next_payment_date {
        return Ok(record.clone());
    }

    let next_payment_date = first_tick_after(record.next_payment_date, record.frequency_type, now)?;
    Ok(Allowance {
        next_payment_date,
        active: !past_end(next_payment_date, record.end_date),
        ..record.clone()
    })
}

pub fn state(record: &Allowance, now: DateTime<Utc>) -> ScheduleState {
    let ended = past_end(record.next_payment_date, record.end_date)
        || record.end_date.map_or(false, |end| now > end);

    if ended {
        ScheduleState::Expired
    } else if !record.active {
        ScheduleState::Paused
    } else if now >= record.next_payment_date {
        ScheduleState::Due
    } else {
        ScheduleState::Scheduled
    }
}

fn past_end(tick: DateTime<Utc>, end_date: Option<DateTime<Utc>>) -> bool {
    end_date.map_or(false, |end| tick > end)
}

/// Smallest `from + k * interval` (k >= 1) strictly greater than `now`.
fn first_tick_after(
    from: DateTime<Utc>,
    frequency: Frequency,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, AllowanceError> {
    match frequency.fixed_interval() {
        Some(interval) => {
            // Fixed intervals are whole seconds, so millisecond arithmetic is exact.
            let interval_ms = interval.num_milliseconds();
            let elapsed_ms = (now - from).num_milliseconds().max(0);
            let steps = elapsed_ms / interval_ms + 1;
            let offset_ms = steps
                .checked_mul(interval_ms)
                .ok_or(AllowanceError::ScheduleOverflow)?;
            from.checked_add_signed(Duration::milliseconds(offset_ms))
                .ok_or(AllowanceError::ScheduleOverflow)
        }
        None => {
            let mut next = advance(from, frequency)?;
            while next <= now {
                next = advance(next, frequency)?;
            }
            Ok(next)
        }
    }
}
