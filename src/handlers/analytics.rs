use crate::{
    auth::OrgContext, services::analytics::TurnoverReport, ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

const DEFAULT_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Deserialize, Default, ToSchema, utoipa::IntoParams)]
pub struct TurnoverQuery {
    /// Window start (default: 30 days before the end)
    pub start: Option<DateTime<Utc>>,
    /// Window end (default: now)
    pub end: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/turnover",
    params(TurnoverQuery),
    responses(
        (status = 200, description = "Turnover metrics per item plus aggregate", body = TurnoverReport),
        (status = 400, description = "Invalid window", body = crate::errors::ErrorResponse)
    ),
    tag = "analytics"
)]
pub async fn turnover(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<TurnoverQuery>,
) -> ApiResult<TurnoverReport> {
    let end = query.end.unwrap_or_else(Utc::now);
    let start = query
        .start
        .unwrap_or_else(|| end - Duration::days(DEFAULT_PERIOD_DAYS));

    let report = state
        .services
        .analytics
        .inventory_turnover(&ctx, start, end)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}
