//! HTTP translation of domain errors.
//!
//! Every failure leaves the service as `{"detail": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;
use tracing::{error, warn};

use crate::domain::errors::AllowanceError;

pub fn status_for(err: &AllowanceError) -> StatusCode {
    match err {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        AllowanceError::InsufficientScope => StatusCode::UNAUTHORIZED,
        AllowanceError::UnauthorizedWallet => StatusCode::FORBIDDEN,
        AllowanceError::NotFound => StatusCode::NOT_FOUND,
        AllowanceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for AllowanceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        match &self {
            AllowanceError::StoreUnavailable(cause) => {
                error!("Allowance store unavailable: {}", cause);
                detail(status, "Allowance store unavailable.")
            }
            other => {
                warn!("Request rejected ({}): {}", status, other);
                detail(status, other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&AllowanceError::InvalidAmount), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&AllowanceError::MissingField("name")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AllowanceError::InvalidFrequency("fortnightly".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&AllowanceError::InvalidDateRange), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&AllowanceError::InsufficientScope),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&AllowanceError::UnauthorizedWallet),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_for(&AllowanceError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&AllowanceError::StoreUnavailable("locked".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
