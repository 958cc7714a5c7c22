//! # REST API for Allowances
//!
//! CRUD endpoints mounted at `/allowance/api/v1/allowance`. Reads accept any
//! key of the owning user; writes need the admin key of the paying wallet.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use shared::{AllowanceDraft, DeleteAllowanceResponse};
use tracing::{info, warn};

use super::api_key::Caller;
use super::errors::detail;
use crate::domain::commands::allowance::{
    CreateAllowanceCommand, DeleteAllowanceCommand, GetAllowanceCommand, ListAllowancesCommand,
    UpdateAllowanceCommand,
};
use crate::io::rest::mappers::allowance_mapper::AllowanceMapper;
use crate::AppState;

/// Create a router for allowance related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_allowances).post(create_allowance))
        .route(
            "/:id",
            get(get_allowance).put(update_allowance).delete(delete_allowance),
        )
}

/// List allowances of every wallet owned by the caller's user
pub async fn list_allowances(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> impl IntoResponse {
    info!("GET /allowance/api/v1/allowance - wallet {}", caller.wallet_id);

    match state
        .allowance_service
        .list_allowances(ListAllowancesCommand { caller })
        .await
    {
        Ok(allowances) => {
            (StatusCode::OK, Json(AllowanceMapper::to_dto_list(allowances))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn get_allowance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(allowance_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /allowance/api/v1/allowance/{}", allowance_id);

    let command = GetAllowanceCommand {
        caller,
        allowance_id,
    };
    match state.allowance_service.get_allowance(command).await {
        Ok(allowance) => (StatusCode::OK, Json(AllowanceMapper::to_dto(allowance))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_allowance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<AllowanceDraft>, JsonRejection>,
) -> impl IntoResponse {
    info!("POST /allowance/api/v1/allowance - wallet {}", caller.wallet_id);

    let draft = match payload {
        Ok(Json(draft)) => draft,
        Err(rejection) => return bad_body(rejection),
    };

    match state
        .allowance_service
        .create_allowance(CreateAllowanceCommand { caller, draft })
        .await
    {
        Ok(allowance) => {
            (StatusCode::CREATED, Json(AllowanceMapper::to_dto(allowance))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Partial update: absent fields keep their stored values
pub async fn update_allowance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(allowance_id): Path<String>,
    payload: Result<Json<AllowanceDraft>, JsonRejection>,
) -> impl IntoResponse {
    info!("PUT /allowance/api/v1/allowance/{}", allowance_id);

    let patch = match payload {
        Ok(Json(patch)) => patch,
        Err(rejection) => return bad_body(rejection),
    };

    let command = UpdateAllowanceCommand {
        caller,
        allowance_id,
        patch,
    };
    match state.allowance_service.update_allowance(command).await {
        Ok(allowance) => (StatusCode::OK, Json(AllowanceMapper::to_dto(allowance))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_allowance(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(allowance_id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /allowance/api/v1/allowance/{}", allowance_id);

    let command = DeleteAllowanceCommand {
        caller,
        allowance_id,
    };
    match state.allowance_service.delete_allowance(command).await {
        Ok(()) => (
            StatusCode::OK,
            Json(DeleteAllowanceResponse {
                message: "Allowance deleted".to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

fn bad_body(rejection: JsonRejection) -> axum::response::Response {
    warn!("Rejected request body: {}", rejection.body_text());
    detail(StatusCode::BAD_REQUEST, rejection.body_text())
}
