//! Consumption engine: irreversible FEFO stock draw-down, bulk variant,
//! and the manual adjustment escape hatch.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::OrgContext;
use crate::entities::batch::{self, Entity as Batch};
use crate::entities::item::ItemStatus;
use crate::entities::stock_movement::{self, MovementType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::availability;
use crate::services::fefo;
use crate::services::items::load_item_scoped;
use crate::services::locks::ItemLocks;

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumeRequest {
    pub item_id: Uuid,
    pub quantity: i32,
    pub reason: Option<String>,
}

/// Per-request result of a bulk consume. Failed requests carry the same
/// stable code the HTTP error path uses, so callers retry only failures.
#[derive(Debug, Clone, Serialize)]
pub struct BulkConsumeOutcome {
    pub item_id: Uuid,
    pub quantity: i32,
    pub success: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub movements: Vec<stock_movement::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Service applying irreversible quantity reductions.
#[derive(Clone)]
pub struct ConsumptionService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    locks: Arc<ItemLocks>,
}

impl ConsumptionService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        locks: Arc<ItemLocks>,
    ) -> Self {
        Self {
            db,
            event_sender,
            locks,
        }
    }

    /// Consumes `quantity` from an item in FEFO order, spanning batches as
    /// needed. All-or-nothing: on insufficient availability no batch is
    /// touched. Returns one journaled movement per batch drawn.
    #[instrument(skip(self, ctx, reason))]
    pub async fn consume_stock(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
        quantity: i32,
        reason: Option<String>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Consume quantity must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(item_id).await;
        let organisation_id = ctx.organisation_id;
        let actor_id = ctx.actor_id;

        let (movements, available_after, reorder_threshold) = self
            .db
            .transaction::<_, (Vec<stock_movement::Model>, i32, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = load_item_scoped(txn, organisation_id, item_id).await?;
                    if ItemStatus::from_str(&item.status) == Some(ItemStatus::Archived) {
                        return Err(ServiceError::Conflict(format!(
                            "Item {} is archived; stock cannot be consumed",
                            item_id
                        )));
                    }

                    let snapshot = availability::batch_availability(txn, item_id).await?;
                    let available_before: i32 = snapshot
                        .iter()
                        .map(|b| b.quantity_remaining - b.quantity_allocated)
                        .sum();

                    let plan = fefo::select_batches(&snapshot, quantity).map_err(|shortfall| {
                        ServiceError::InsufficientStock(format!(
                            "Item {}: requested {}, available {}",
                            item_id, shortfall.requested, shortfall.available
                        ))
                    })?;

                    let now = Utc::now();
                    let mut movements = Vec::with_capacity(plan.len());
                    for draw in plan {
                        let current = snapshot
                            .iter()
                            .find(|b| b.batch_id == draw.batch_id)
                            .ok_or_else(|| {
                                ServiceError::InternalError(format!(
                                    "Planned batch {} missing from availability snapshot",
                                    draw.batch_id
                                ))
                            })?;
                        let new_remaining = current.quantity_remaining - draw.quantity;

                        batch::ActiveModel {
                            id: Set(draw.batch_id),
                            quantity_remaining: Set(new_remaining),
                            updated_at: Set(now),
                            ..Default::default()
                        }
                        .update(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        let movement = stock_movement::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            organisation_id: Set(organisation_id),
                            item_id: Set(item_id),
                            batch_id: Set(draw.batch_id),
                            movement_type: Set(MovementType::Consume.as_str().to_string()),
                            delta: Set(-draw.quantity),
                            resulting_remaining: Set(new_remaining),
                            actor_id: Set(actor_id),
                            reason: Set(reason.clone()),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        movements.push(movement);
                    }

                    Ok((movements, available_before - quantity, item.reorder_threshold))
                })
            })
            .await?;

        self.event_sender
            .emit(Event::StockConsumed {
                item_id,
                batch_ids: movements.iter().map(|m| m.batch_id).collect(),
                quantity,
            })
            .await;
        if available_after < reorder_threshold {
            self.event_sender
                .emit(Event::LowStockDetected {
                    item_id,
                    available: available_after,
                    reorder_threshold,
                })
                .await;
        }

        info!(
            item_id = %item_id,
            quantity = quantity,
            batches = movements.len(),
            "Consumed stock"
        );
        Ok(movements)
    }

    /// Processes each request independently and atomically; a failing
    /// request does not affect the others, including later requests on the
    /// same item.
    #[instrument(skip(self, ctx, requests), fields(request_count = requests.len()))]
    pub async fn bulk_consume_stock(
        &self,
        ctx: &OrgContext,
        requests: Vec<ConsumeRequest>,
    ) -> Result<Vec<BulkConsumeOutcome>, ServiceError> {
        let mut outcomes = Vec::with_capacity(requests.len());

        for request in requests {
            let outcome = match self
                .consume_stock(ctx, request.item_id, request.quantity, request.reason.clone())
                .await
            {
                Ok(movements) => BulkConsumeOutcome {
                    item_id: request.item_id,
                    quantity: request.quantity,
                    success: true,
                    movements,
                    error_code: None,
                    error_message: None,
                },
                Err(err) => BulkConsumeOutcome {
                    item_id: request.item_id,
                    quantity: request.quantity,
                    success: false,
                    movements: Vec::new(),
                    error_code: Some(err.code().to_string()),
                    error_message: Some(err.response_message()),
                },
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Direct correction of a single batch (recount, spoilage, returned
    /// goods). Negative deltas cannot cut into quantity held by active
    /// allocations; positive deltas cannot exceed the received quantity.
    #[instrument(skip(self, ctx, reason))]
    pub async fn adjust_stock(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
        batch_id: Uuid,
        delta: i32,
        reason: Option<String>,
    ) -> Result<stock_movement::Model, ServiceError> {
        if delta == 0 {
            return Err(ServiceError::ValidationError(
                "Adjustment delta must be non-zero".to_string(),
            ));
        }

        let _guard = self.locks.acquire(item_id).await;
        let organisation_id = ctx.organisation_id;
        let actor_id = ctx.actor_id;

        let (movement, new_remaining, available_after, reorder_threshold) = self
            .db
            .transaction::<_, (stock_movement::Model, i32, i32, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = load_item_scoped(txn, organisation_id, item_id).await?;
                    if ItemStatus::from_str(&item.status) == Some(ItemStatus::Archived) {
                        return Err(ServiceError::Conflict(format!(
                            "Item {} is archived; stock cannot be adjusted",
                            item_id
                        )));
                    }

                    let target = Batch::find_by_id(batch_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .filter(|b| b.item_id == item_id)
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Batch {} not found for item {}",
                                batch_id, item_id
                            ))
                        })?;

                    let allocated = availability::active_allocation_totals(txn, item_id)
                        .await?
                        .get(&batch_id)
                        .copied()
                        .unwrap_or(0);

                    let new_remaining = target.quantity_remaining + delta;
                    if new_remaining < allocated {
                        return Err(ServiceError::Conflict(format!(
                            "Adjustment would leave batch {} below its active allocation total of {}",
                            batch_id, allocated
                        )));
                    }
                    if new_remaining > target.quantity_received {
                        return Err(ServiceError::ValidationError(format!(
                            "Adjustment would exceed batch {}'s received quantity of {}",
                            batch_id, target.quantity_received
                        )));
                    }

                    let available_before = availability::item_available(txn, item_id).await?;

                    let now = Utc::now();
                    let mut active: batch::ActiveModel = target.into();
                    active.quantity_remaining = Set(new_remaining);
                    active.updated_at = Set(now);
                    active.update(txn).await.map_err(ServiceError::db_error)?;

                    let movement = stock_movement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        organisation_id: Set(organisation_id),
                        item_id: Set(item_id),
                        batch_id: Set(batch_id),
                        movement_type: Set(MovementType::Adjust.as_str().to_string()),
                        delta: Set(delta),
                        resulting_remaining: Set(new_remaining),
                        actor_id: Set(actor_id),
                        reason: Set(reason.clone()),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok((
                        movement,
                        new_remaining,
                        available_before + delta,
                        item.reorder_threshold,
                    ))
                })
            })
            .await?;

        self.event_sender
            .emit(Event::StockAdjusted {
                item_id,
                batch_id,
                delta,
                new_remaining,
            })
            .await;
        if delta < 0 && available_after < reorder_threshold {
            self.event_sender
                .emit(Event::LowStockDetected {
                    item_id,
                    available: available_after,
                    reorder_threshold,
                })
                .await;
        }

        info!(
            item_id = %item_id,
            batch_id = %batch_id,
            delta = delta,
            "Adjusted stock"
        );
        Ok(movement)
    }
}
