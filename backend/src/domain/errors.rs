//! Error taxonomy for allowance operations.

use thiserror::Error;

/// Everything that can go wrong when validating, scheduling or persisting an
/// allowance.
///
/// Validation variants are always raised before the store is touched.
/// `StoreUnavailable` carries the rendered storage error; it is never
/// retried here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowanceError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Amount must be a whole number greater than 0")]
    InvalidAmount,

    #[error("Invalid frequency type: '{0}'")]
    InvalidFrequency(String),

    #[error("Invalid currency: '{0}'")]
    InvalidCurrency(String),

    #[error("Invalid date for {field}: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("End date must not be before start date")]
    InvalidDateRange,

    #[error("Payment schedule overflows the supported date range")]
    ScheduleOverflow,

    #[error("Not your allowance.")]
    UnauthorizedWallet,

    #[error("Invalid API key or insufficient key scope.")]
    InsufficientScope,

    #[error("Allowance does not exist.")]
    NotFound,

    #[error("Allowance store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AllowanceError {
    /// Wrap a storage failure
    pub fn store(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{:#}", err))
    }

    /// True for errors caused by the submitted input rather than by the
    /// caller's identity or the backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_)
                | Self::InvalidAmount
                | Self::InvalidFrequency(_)
                | Self::InvalidCurrency(_)
                | Self::InvalidDate { .. }
                | Self::InvalidDateRange
                | Self::ScheduleOverflow
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_keeps_context() {
        let err = anyhow::anyhow!("connection refused").context("loading allowance");
        let wrapped = AllowanceError::store(err);
        assert_eq!(
            wrapped.to_string(),
            "Allowance store unavailable: loading allowance: connection refused"
        );
        assert!(!wrapped.is_validation());
    }

    #[test]
    fn test_validation_classification() {
        assert!(AllowanceError::MissingField("name").is_validation());
        assert!(AllowanceError::InvalidFrequency("fortnightly".to_string()).is_validation());
        assert!(!AllowanceError::UnauthorizedWallet.is_validation());
        assert!(!AllowanceError::NotFound.is_validation());
    }
}
