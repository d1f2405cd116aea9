use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "VetStock Inventory API",
        description = "Stock & allocation ledger for the VetStock veterinary clinic platform",
        version = "0.3.0"
    ),
    paths(
        crate::handlers::items::create_item,
        crate::handlers::items::update_item,
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
        crate::handlers::items::hide_item,
        crate::handlers::items::activate_item,
        crate::handlers::items::archive_item,
        crate::handlers::batches::add_batch,
        crate::handlers::batches::update_batch,
        crate::handlers::batches::delete_batch,
        crate::handlers::stock::consume_stock,
        crate::handlers::stock::bulk_consume_stock,
        crate::handlers::stock::adjust_stock,
        crate::handlers::stock::allocate_stock,
        crate::handlers::stock::release_allocation,
        crate::handlers::alerts::low_stock,
        crate::handlers::alerts::expiring,
        crate::handlers::analytics::turnover,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::items::CreateItemRequest,
        crate::handlers::items::UpdateItemRequest,
        crate::handlers::items::ItemSummary,
        crate::handlers::items::BatchSummary,
        crate::handlers::items::ItemWithBatchesResponse,
        crate::handlers::batches::AddBatchRequest,
        crate::handlers::batches::UpdateBatchRequest,
        crate::handlers::stock::ConsumeStockRequest,
        crate::handlers::stock::BulkConsumeStockRequest,
        crate::handlers::stock::AdjustStockRequest,
        crate::handlers::stock::AllocateStockRequest,
        crate::handlers::stock::MovementSummary,
        crate::handlers::stock::AllocationSummary,
        crate::handlers::stock::BulkConsumeOutcomeResponse,
        crate::services::alerts::LowStockAlert,
        crate::services::alerts::ExpiringBatchAlert,
        crate::services::alerts::ExpiringItemBatches,
        crate::services::analytics::ItemTurnover,
        crate::services::analytics::TurnoverAggregate,
        crate::services::analytics::TurnoverReport,
    )),
    tags(
        (name = "items", description = "Item catalog"),
        (name = "batches", description = "Stock batch ledger"),
        (name = "stock", description = "Consumption, adjustment, and allocation"),
        (name = "alerts", description = "Low-stock and expiry alerts"),
        (name = "analytics", description = "Turnover analytics")
    )
)]
pub struct ApiDoc;

/// Swagger UI mounted at /docs with the generated document at
/// /api-docs/openapi.json.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
