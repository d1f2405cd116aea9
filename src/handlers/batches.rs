use crate::{
    auth::OrgContext,
    errors::ServiceError,
    handlers::items::BatchSummary,
    services::batches::{AddBatchInput, UpdateBatchInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddBatchRequest {
    #[validate(length(min = 1, message = "Batch number cannot be empty"))]
    pub batch_number: String,
    /// Absent or null means the batch never expires
    pub expiry_date: Option<NaiveDate>,
    #[validate(range(min = 1, message = "Quantity received must be positive"))]
    pub quantity_received: i32,
    #[schema(value_type = Option<String>)]
    pub unit_cost: Option<Decimal>,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateBatchRequest {
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub unit_cost: Option<Decimal>,
}

#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/batches",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = AddBatchRequest,
    responses(
        (status = 201, description = "Batch received", body = BatchSummary),
        (status = 409, description = "Item not active", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn add_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<AddBatchRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .batches
        .add_batch(
            &ctx,
            item_id,
            AddBatchInput {
                batch_number: payload.batch_number,
                expiry_date: payload.expiry_date,
                quantity_received: payload.quantity_received,
                unit_cost: payload.unit_cost,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BatchSummary::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/batches/{id}",
    params(("id" = Uuid, Path, description = "Batch ID")),
    request_body = UpdateBatchRequest,
    responses(
        (status = 200, description = "Batch updated", body = BatchSummary),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn update_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(batch_id): Path<Uuid>,
    Json(payload): Json<UpdateBatchRequest>,
) -> ApiResult<BatchSummary> {
    let updated = state
        .services
        .batches
        .update_batch(
            &ctx,
            batch_id,
            UpdateBatchInput {
                batch_number: payload.batch_number,
                expiry_date: payload.expiry_date,
                unit_cost: payload.unit_cost,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(BatchSummary::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/batches/{id}",
    params(("id" = Uuid, Path, description = "Batch ID")),
    responses(
        (status = 204, description = "Batch deleted"),
        (status = 409, description = "Batch still has stock or active holds", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "batches"
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(batch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.batches.delete_batch(&ctx, batch_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
