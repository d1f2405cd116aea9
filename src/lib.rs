//! VetStock Inventory API Library
//!
//! Stock & allocation ledger for the VetStock veterinary clinic platform:
//! per-batch quantities with expiry, FEFO consumption, reversible holds,
//! and an append-only movement journal.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, routing::post, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::{consts as perm, AuthRouterExt};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Full v1 API surface, permission-gated per subtree.
pub fn api_v1_routes() -> Router<AppState> {
    let items_read = Router::new()
        .route("/items", get(handlers::items::list_items))
        .route("/items/:id", get(handlers::items::get_item))
        .with_permission(perm::INVENTORY_VIEW);

    let items_edit = Router::new()
        .route("/items", post(handlers::items::create_item))
        .route("/items/:id", axum::routing::put(handlers::items::update_item))
        .route("/items/:id/hide", post(handlers::items::hide_item))
        .route("/items/:id/activate", post(handlers::items::activate_item))
        .route("/items/:id/archive", post(handlers::items::archive_item))
        .with_permission(perm::INVENTORY_EDIT);

    let batches_edit = Router::new()
        .route("/items/:id/batches", post(handlers::batches::add_batch))
        .route(
            "/batches/:id",
            axum::routing::put(handlers::batches::update_batch)
                .delete(handlers::batches::delete_batch),
        )
        .with_permission(perm::INVENTORY_EDIT);

    let stock_edit = Router::new()
        .route("/stock/consume", post(handlers::stock::consume_stock))
        .route(
            "/stock/consume/bulk",
            post(handlers::stock::bulk_consume_stock),
        )
        .route("/stock/adjust", post(handlers::stock::adjust_stock))
        .route("/stock/allocate", post(handlers::stock::allocate_stock))
        .route(
            "/stock/allocations/:id/release",
            post(handlers::stock::release_allocation),
        )
        .with_permission(perm::INVENTORY_EDIT);

    let alerts_read = Router::new()
        .route("/alerts/low-stock", get(handlers::alerts::low_stock))
        .route("/alerts/expiring", get(handlers::alerts::expiring))
        .with_permission(perm::INVENTORY_VIEW);

    let analytics_read = Router::new()
        .route("/analytics/turnover", get(handlers::analytics::turnover))
        .with_permission(perm::INVENTORY_VIEW);

    Router::new()
        // Status and health endpoints (ungated)
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Item catalog
        .merge(items_read)
        .merge(items_edit)
        // Batch ledger
        .merge(batches_edit)
        // Consumption, adjustment, allocation
        .merge(stock_edit)
        // Projections
        .merge(alerts_read)
        .merge(analytics_read)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "vetstock-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
