//! # Frequency Policy
//!
//! Maps a frequency tag to the rule that advances a payment timestamp by one
//! interval. Calendar-based frequencies (monthly, yearly) keep the day of
//! month and clamp to the last valid day when it does not exist in the
//! target month, e.g. Jan 31 + 1 month = Feb 29 in a leap year.
//!
//! Unknown tags are rejected. There is no fallback frequency.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};

use super::errors::AllowanceError;

/// Interval used for the legacy `per_second` tag, which the streaming demo
/// actually fired every ten seconds.
pub const PER_SECOND_STREAMING_INTERVAL: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Fixed short interval for streaming micro-payments
    Streaming { seconds: u32 },
}

impl Frequency {
    /// Length of one interval for frequencies that do not depend on the
    /// calendar.
    pub fn fixed_interval(&self) -> Option<Duration> {
        match self {
            Frequency::Minutely => Some(Duration::minutes(1)),
            Frequency::Hourly => Some(Duration::hours(1)),
            Frequency::Daily => Some(Duration::days(1)),
            Frequency::Weekly => Some(Duration::days(7)),
            Frequency::Streaming { seconds } => Some(Duration::seconds(i64::from(*seconds))),
            Frequency::Monthly | Frequency::Yearly => None,
        }
    }

    /// Advance `timestamp` by exactly one interval.
    pub fn advance(&self, timestamp: DateTime<Utc>) -> Result<DateTime<Utc>, AllowanceError> {
        let next = match self {
            Frequency::Monthly => timestamp.checked_add_months(Months::new(1)),
            Frequency::Yearly => timestamp.checked_add_months(Months::new(12)),
            fixed => fixed
                .fixed_interval()
                .and_then(|interval| timestamp.checked_add_signed(interval)),
        };
        next.ok_or(AllowanceError::ScheduleOverflow)
    }

    /// Human readable cadence, used in log lines
    pub fn interval_hint(&self) -> String {
        match self {
            Frequency::Minutely => "every minute".to_string(),
            Frequency::Hourly => "every hour".to_string(),
            Frequency::Daily => "every day".to_string(),
            Frequency::Weekly => "every week".to_string(),
            Frequency::Monthly => "every month".to_string(),
            Frequency::Yearly => "every year".to_string(),
            Frequency::Streaming { seconds: 1 } => "every second".to_string(),
            Frequency::Streaming { seconds } => format!("every {} seconds", seconds),
        }
    }
}

/// Advance `timestamp` by one interval of `frequency`.
///
/// The result is always strictly later than the input.
pub fn advance(
    timestamp: DateTime<Utc>,
    frequency: Frequency,
) -> Result<DateTime<Utc>, AllowanceError> {
    frequency.advance(timestamp)
}

impl FromStr for Frequency {
    type Err = AllowanceError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let invalid = || AllowanceError::InvalidFrequency(tag.to_string());

        match tag.trim().to_ascii_lowercase().as_str() {
            "minutely" => Ok(Frequency::Minutely),
            "hourly" => Ok(Frequency::Hourly),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            "per_second" => Ok(Frequency::Streaming {
                seconds: PER_SECOND_STREAMING_INTERVAL,
            }),
            other => {
                let seconds: u32 = other
                    .strip_prefix("streaming-")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(invalid)?;
                if seconds == 0 {
                    return Err(invalid());
                }
                Ok(Frequency::Streaming { seconds })
            }
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Minutely => write!(f, "minutely"),
            Frequency::Hourly => write!(f, "hourly"),
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
            Frequency::Streaming { seconds } => write!(f, "streaming-{}", seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    const ALL: [Frequency; 8] = [
        Frequency::Minutely,
        Frequency::Hourly,
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Yearly,
        Frequency::Streaming { seconds: 1 },
        Frequency::Streaming { seconds: 10 },
    ];

    #[test]
    fn test_advance_is_strictly_monotonic() {
        let samples = [
            utc(2024, 1, 31, 0, 0, 0),
            utc(2024, 2, 29, 23, 59, 59),
            utc(2023, 12, 31, 12, 0, 0),
            utc(1999, 6, 15, 8, 30, 0),
        ];
        for frequency in ALL {
            for t in samples {
                let next = advance(t, frequency).unwrap();
                assert!(next > t, "{} did not advance {}", frequency, t);
            }
        }
    }

    #[test]
    fn test_fixed_rules() {
        let t = utc(2024, 1, 1, 0, 0, 0);
        assert_eq!(advance(t, Frequency::Minutely).unwrap(), utc(2024, 1, 1, 0, 1, 0));
        assert_eq!(advance(t, Frequency::Hourly).unwrap(), utc(2024, 1, 1, 1, 0, 0));
        assert_eq!(advance(t, Frequency::Daily).unwrap(), utc(2024, 1, 2, 0, 0, 0));
        assert_eq!(advance(t, Frequency::Weekly).unwrap(), utc(2024, 1, 8, 0, 0, 0));
        assert_eq!(
            advance(t, Frequency::Streaming { seconds: 10 }).unwrap(),
            utc(2024, 1, 1, 0, 0, 10)
        );
    }

    #[test]
    fn test_monthly_clamps_to_end_of_month() {
        assert_eq!(
            advance(utc(2024, 1, 31, 0, 0, 0), Frequency::Monthly).unwrap(),
            utc(2024, 2, 29, 0, 0, 0)
        );
        assert_eq!(
            advance(utc(2023, 1, 31, 0, 0, 0), Frequency::Monthly).unwrap(),
            utc(2023, 2, 28, 0, 0, 0)
        );
        assert_eq!(
            advance(utc(2024, 3, 15, 9, 0, 0), Frequency::Monthly).unwrap(),
            utc(2024, 4, 15, 9, 0, 0)
        );
    }

    #[test]
    fn test_yearly_clamps_leap_day() {
        assert_eq!(
            advance(utc(2024, 2, 29, 0, 0, 0), Frequency::Yearly).unwrap(),
            utc(2025, 2, 28, 0, 0, 0)
        );
        assert_eq!(
            advance(utc(2023, 7, 4, 0, 0, 0), Frequency::Yearly).unwrap(),
            utc(2024, 7, 4, 0, 0, 0)
        );
    }

    #[test]
    fn test_unknown_frequency_is_rejected_not_weekly() {
        let result = "fortnightly".parse::<Frequency>();
        assert_eq!(
            result,
            Err(AllowanceError::InvalidFrequency("fortnightly".to_string()))
        );
        assert!("".parse::<Frequency>().is_err());
        assert!("streaming-0".parse::<Frequency>().is_err());
        assert!("streaming-".parse::<Frequency>().is_err());
        assert!("streaming--5".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_tags_round_trip_through_display() {
        for frequency in ALL {
            let tag = frequency.to_string();
            assert_eq!(tag.parse::<Frequency>().unwrap(), frequency);
        }
    }

    #[test]
    fn test_per_second_alias_is_ten_second_streaming() {
        let frequency: Frequency = "per_second".parse().unwrap();
        assert_eq!(frequency, Frequency::Streaming { seconds: 10 });
        assert_eq!(frequency.to_string(), "streaming-10");
        assert_eq!(frequency.interval_hint(), "every 10 seconds");
    }

    #[test]
    fn test_tags_are_case_insensitive() {
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!(" MONTHLY ".parse::<Frequency>().unwrap(), Frequency::Monthly);
    }

    #[test]
    fn test_overflow_is_reported() {
        let result = advance(DateTime::<Utc>::MAX_UTC, Frequency::Daily);
        assert_eq!(result, Err(AllowanceError::ScheduleOverflow));
    }
}
