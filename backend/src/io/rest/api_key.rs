//! Caller resolution from the `X-Api-Key` header.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::errors::detail;
use crate::domain::errors::AllowanceError;
use crate::domain::wallet_keys::WalletAccess;
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The wallet behind the presented API key.
///
/// Rejects the request with 401 when the header is missing or the key is
/// unknown. Scope checks happen in the domain layer.
#[derive(Debug, Clone)]
pub struct Caller(pub WalletAccess);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|key| !key.is_empty());

        let Some(api_key) = api_key else {
            warn!("{} {} without API key", parts.method, parts.uri.path());
            return Err(detail(StatusCode::UNAUTHORIZED, "Missing X-Api-Key header."));
        };

        match state.wallet_keys.resolve(api_key) {
            Some(access) => Ok(Caller(access)),
            None => {
                warn!("{} {} with unknown API key", parts.method, parts.uri.path());
                Err(AllowanceError::InsufficientScope.into_response())
            }
        }
    }
}
