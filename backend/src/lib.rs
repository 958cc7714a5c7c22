//! # Allowance Backend
//!
//! Recurring Lightning allowances: a REST service that lets wallet owners
//! schedule fixed payments to a Lightning address, and a background
//! scheduler that pays them when they fall due.
//!
//! ## Layers
//!
//! - **domain**: Validation, schedule arithmetic, services and the scheduler
//! - **storage**: SQLite persistence behind storage traits
//! - **io**: axum REST endpoints
//! - **config**: YAML configuration with environment overrides

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{
    AllowanceService, DryRunGateway, PaymentScheduler, RecordLocks, WalletKeyResolver,
};
use crate::io::rest::{allowance_apis, health_apis};
use crate::storage::DbConnection;

#[derive(Clone)]
pub struct AppState {
    pub allowance_service: AllowanceService,
    pub wallet_keys: Arc<dyn WalletKeyResolver>,
}

/// Everything the server binary runs
pub struct Backend {
    pub app_state: AppState,
    pub payment_scheduler: PaymentScheduler,
}

pub async fn initialize_backend(config: &AppConfig) -> Result<Backend> {
    info!("Setting up database");
    let db_conn = Arc::new(DbConnection::new(&config.database_url).await?);

    info!("Setting up domain model");
    let locks = RecordLocks::new();
    let allowance_service = AllowanceService::new(db_conn.clone(), locks.clone());
    let payment_scheduler = PaymentScheduler::new(db_conn, Arc::new(DryRunGateway), locks)
        .with_max_attempts(config.scheduler.max_attempts);

    let wallet_keys = config.wallet_keys();
    if wallet_keys.is_empty() {
        info!("No wallets configured; every authenticated request will be rejected");
    } else {
        info!("Loaded keys for {} wallets", wallet_keys.len());
    }

    info!("Setting up application state");
    let app_state = AppState {
        allowance_service,
        wallet_keys: Arc::new(wallet_keys),
    };

    Ok(Backend {
        app_state,
        payment_scheduler,
    })
}

pub fn create_router(app_state: AppState, cors_origin: Option<&str>) -> Result<Router> {
    // CORS setup to allow the allowance forms to make requests
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    let cors = match cors_origin {
        Some(origin) => cors.allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{}'", origin))?,
        ),
        None => cors.allow_origin(Any),
    };

    let api_routes = Router::new()
        .nest("/allowance", allowance_apis::router())
        .route("/health", get(health_apis::health));

    Ok(Router::new()
        .nest("/allowance/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
