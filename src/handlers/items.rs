use crate::{
    auth::OrgContext,
    entities::{batch, item, item::ItemStatus},
    errors::ServiceError,
    services::items::{CreateItemInput, UpdateItemInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    pub category: Option<String>,
    #[validate(length(min = 1, message = "Unit of measure cannot be empty"))]
    pub unit_of_measure: String,
    #[validate(range(min = 0, message = "Reorder threshold cannot be negative"))]
    #[serde(default)]
    pub reorder_threshold: i32,
}

#[derive(Debug, Deserialize, Default, ToSchema)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_of_measure: Option<String>,
    pub reorder_threshold: Option<i32>,
}

#[derive(Debug, Deserialize, Default, ToSchema, utoipa::IntoParams)]
pub struct ItemListQuery {
    /// Optional lifecycle status filter (ACTIVE, HIDDEN, ARCHIVED)
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemSummary {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub unit_of_measure: String,
    pub reorder_threshold: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<item::Model> for ItemSummary {
    fn from(model: item::Model) -> Self {
        Self {
            id: model.id,
            organisation_id: model.organisation_id,
            name: model.name,
            category: model.category,
            unit_of_measure: model.unit_of_measure,
            reorder_threshold: model.reorder_threshold,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchSummary {
    pub id: Uuid,
    pub item_id: Uuid,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub quantity_received: i32,
    pub quantity_remaining: i32,
    #[schema(value_type = Option<String>)]
    pub unit_cost: Option<rust_decimal::Decimal>,
    pub received_at: DateTime<Utc>,
}

impl From<batch::Model> for BatchSummary {
    fn from(model: batch::Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            batch_number: model.batch_number,
            expiry_date: model.expiry_date,
            quantity_received: model.quantity_received,
            quantity_remaining: model.quantity_remaining,
            unit_cost: model.unit_cost,
            received_at: model.received_at,
        }
    }
}

/// Item plus its batches in consumption (FEFO) order.
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemWithBatchesResponse {
    #[serde(flatten)]
    pub item: ItemSummary,
    pub batches: Vec<BatchSummary>,
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemSummary),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .services
        .items
        .create_item(
            &ctx,
            CreateItemInput {
                name: payload.name,
                category: payload.category,
                unit_of_measure: payload.unit_of_measure,
                reorder_threshold: payload.reorder_threshold,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ItemSummary::from(created))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemSummary),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> ApiResult<ItemSummary> {
    let updated = state
        .services
        .items
        .update_item(
            &ctx,
            id,
            UpdateItemInput {
                name: payload.name,
                category: payload.category,
                unit_of_measure: payload.unit_of_measure,
                reorder_threshold: payload.reorder_threshold,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(ItemSummary::from(updated))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Items for the caller's organisation", body = [ItemSummary])
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Vec<ItemSummary>> {
    let status_filter = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(ItemStatus::from_str(raw).ok_or_else(|| {
            ServiceError::ValidationError(format!("Unknown item status {}", raw))
        })?),
    };

    let items = state.services.items.list_items(&ctx, status_filter).await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(ItemSummary::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item with batches in FEFO order", body = ItemWithBatchesResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ItemWithBatchesResponse> {
    let result = state.services.items.get_item_with_batches(&ctx, id).await?;

    Ok(Json(ApiResponse::success(ItemWithBatchesResponse {
        item: ItemSummary::from(result.item),
        batches: result.batches.into_iter().map(BatchSummary::from).collect(),
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/hide",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item hidden", body = ItemSummary),
        (status = 409, description = "Item archived", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn hide_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ItemSummary> {
    let updated = state.services.items.hide_item(&ctx, id).await?;
    Ok(Json(ApiResponse::success(ItemSummary::from(updated))))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/activate",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item activated", body = ItemSummary),
        (status = 409, description = "Item archived", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn activate_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ItemSummary> {
    let updated = state.services.items.activate_item(&ctx, id).await?;
    Ok(Json(ApiResponse::success(ItemSummary::from(updated))))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/archive",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item archived", body = ItemSummary),
        (status = 409, description = "Stock still available", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn archive_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<OrgContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<ItemSummary> {
    let updated = state.services.items.archive_item(&ctx, id).await?;
    Ok(Json(ApiResponse::success(ItemSummary::from(updated))))
}
