use crate::{
    auth::OrgContext,
    entities::{allocation, stock_movement},
    errors::ServiceError,
    services::consumption::{BulkConsumeOutcome, ConsumeRequest},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const MAX_BULK_REQUESTS: usize = 100;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ConsumeStockRequest {
    pub item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkConsumeStockRequest {
    pub requests: Vec<ConsumeStockRequest>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    pub item_id: Uuid,
    pub batch_id: Uuid,
    /// Signed correction; positive re-adds stock, negative removes it
    pub delta: i32,
    #[validate(length(min = 1, message = "Reason cannot be empty"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AllocateStockRequest {
    pub item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    #[validate(length(min = 1, message = "Reference cannot be empty"))]
    pub reserved_for: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementSummary {
    pub id: Uuid,
    pub item_id: Uuid,
    pub batch_id: Uuid,
    pub movement_type: String,
    pub delta: i32,
    pub resulting_remaining: i32,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<stock_movement::Model> for MovementSummary {
    fn from(model: stock_movement::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            batch_id: model.batch_id,
            movement_type: model.movement_type,
            delta: model.delta,
            resulting_remaining: model.resulting_remaining,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AllocationSummary {
    pub id: Uuid,
    pub item_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub reserved_for: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<allocation::Model> for AllocationSummary {
    fn from(model: allocation::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            batch_id: model.batch_id,
            quantity: model.quantity,
            reserved_for: model.reserved_for,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkConsumeOutcomeResponse {
    pub item_id: Uuid,
    pub quantity: i32,
    pub success: bool,
    pub movements: Vec<MovementSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<BulkConsumeOutcome> for BulkConsumeOutcomeResponse {
    fn from(outcome: BulkConsumeOutcome) -> Self {
        Self {
            item_id: outcome.item_id,
            quantity: outcome.quantity,
            success: outcome.success,
            movements: outcome
                .movements
                .into_iter()
                .map(MovementSummary::from)
                .collect(),
            error_code: outcome.error_code,
            error_message: outcome.error_message,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/stock/consume",
    request_body = ConsumeStockRequest,
    responses(
        (status = 200, description = "Stock consumed; one movement per batch drawn", body = [MovementSummary]),
        (status = 409, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn consume_stock(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<ConsumeStockRequest>,
) -> ApiResult<Vec<MovementSummary>> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let movements = state
        .services
        .consumption
        .consume_stock(&ctx, payload.item_id, payload.quantity, payload.reason)
        .await?;

    Ok(Json(ApiResponse::success(
        movements.into_iter().map(MovementSummary::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock/consume/bulk",
    request_body = BulkConsumeStockRequest,
    responses(
        (status = 200, description = "Per-request outcomes; partial success is possible", body = [BulkConsumeOutcomeResponse]),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn bulk_consume_stock(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<BulkConsumeStockRequest>,
) -> ApiResult<Vec<BulkConsumeOutcomeResponse>> {
    if payload.requests.is_empty() {
        return Err(ServiceError::ValidationError(
            "Bulk consume requires at least one request".to_string(),
        ));
    }
    if payload.requests.len() > MAX_BULK_REQUESTS {
        return Err(ServiceError::ValidationError(format!(
            "Bulk consume accepts at most {} requests",
            MAX_BULK_REQUESTS
        )));
    }

    let requests = payload
        .requests
        .into_iter()
        .map(|r| ConsumeRequest {
            item_id: r.item_id,
            quantity: r.quantity,
            reason: r.reason,
        })
        .collect();

    let outcomes = state
        .services
        .consumption
        .bulk_consume_stock(&ctx, requests)
        .await?;

    Ok(Json(ApiResponse::success(
        outcomes
            .into_iter()
            .map(BulkConsumeOutcomeResponse::from)
            .collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock/adjust",
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = MovementSummary),
        (status = 409, description = "Adjustment conflicts with active holds", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item or batch not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<AdjustStockRequest>,
) -> ApiResult<MovementSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let movement = state
        .services
        .consumption
        .adjust_stock(
            &ctx,
            payload.item_id,
            payload.batch_id,
            payload.delta,
            Some(payload.reason),
        )
        .await?;

    Ok(Json(ApiResponse::success(MovementSummary::from(movement))))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock/allocate",
    request_body = AllocateStockRequest,
    responses(
        (status = 200, description = "Stock allocated; one hold per batch drawn", body = [AllocationSummary]),
        (status = 409, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn allocate_stock(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<AllocateStockRequest>,
) -> ApiResult<Vec<AllocationSummary>> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let allocations = state
        .services
        .allocation
        .allocate_stock(&ctx, payload.item_id, payload.quantity, payload.reserved_for)
        .await?;

    Ok(Json(ApiResponse::success(
        allocations
            .into_iter()
            .map(AllocationSummary::from)
            .collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/stock/allocations/{id}/release",
    params(("id" = Uuid, Path, description = "Allocation ID")),
    responses(
        (status = 200, description = "Allocation released", body = AllocationSummary),
        (status = 409, description = "Allocation already released or consumed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "stock"
)]
pub async fn release_allocation(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(allocation_id): Path<Uuid>,
) -> ApiResult<AllocationSummary> {
    let released = state
        .services
        .allocation
        .release_allocated_stock(&ctx, allocation_id)
        .await?;

    Ok(Json(ApiResponse::success(AllocationSummary::from(released))))
}
