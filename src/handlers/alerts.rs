use crate::{
    auth::OrgContext,
    errors::ServiceError,
    services::alerts::{ExpiringItemBatches, LowStockAlert},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 30;
const MAX_EXPIRY_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Deserialize, Default, ToSchema, utoipa::IntoParams)]
pub struct ExpiringQuery {
    /// Days ahead to look for expiring batches (default 30, max 365)
    pub window_days: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/low-stock",
    responses(
        (status = 200, description = "Items below their reorder threshold", body = [LowStockAlert])
    ),
    tag = "alerts"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
) -> ApiResult<Vec<LowStockAlert>> {
    let alerts = state.services.alerts.low_stock_items(&ctx).await?;
    Ok(Json(ApiResponse::success(alerts)))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts/expiring",
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Batches expiring within the window, grouped by item", body = [ExpiringItemBatches]),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn expiring(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<ExpiringQuery>,
) -> ApiResult<Vec<ExpiringItemBatches>> {
    let window_days = query.window_days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    if window_days == 0 || window_days > MAX_EXPIRY_WINDOW_DAYS {
        return Err(ServiceError::ValidationError(format!(
            "window_days must be between 1 and {}",
            MAX_EXPIRY_WINDOW_DAYS
        )));
    }

    let alerts = state
        .services
        .alerts
        .expiring_batches(&ctx, window_days)
        .await?;
    Ok(Json(ApiResponse::success(alerts)))
}
