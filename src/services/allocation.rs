//! Stock allocator: reversible holds sharing the consumption engine's
//! FEFO selection, without touching batch remaining quantities.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::OrgContext;
use crate::entities::allocation::{self, AllocationStatus, Entity as Allocation};
use crate::entities::batch::Entity as Batch;
use crate::entities::item::ItemStatus;
use crate::entities::stock_movement::{self, MovementType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::availability;
use crate::services::fefo;
use crate::services::items::load_item_scoped;
use crate::services::locks::ItemLocks;

/// Service creating and releasing reversible stock holds.
#[derive(Clone)]
pub struct AllocationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    locks: Arc<ItemLocks>,
}

impl AllocationService {
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

    /// Places a hold of `quantity` against FEFO-selected batches. Creates
    /// one allocation per batch drawn; batch remaining quantities are not
    /// modified. All-or-nothing on insufficient availability.
    #[instrument(skip(self, ctx, reserved_for))]
    pub async fn allocate_stock(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
        quantity: i32,
        reserved_for: String,
    ) -> Result<Vec<allocation::Model>, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "Allocation quantity must be positive".to_string(),
            ));
        }
        if reserved_for.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Allocation reference cannot be empty".to_string(),
            ));
        }

        let _guard = self.locks.acquire(item_id).await;
        let organisation_id = ctx.organisation_id;
        let actor_id = ctx.actor_id;
        let reference = reserved_for.trim().to_string();
        let reference_for_event = reference.clone();

        let allocations = self
            .db
            .transaction::<_, Vec<allocation::Model>, ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = load_item_scoped(txn, organisation_id, item_id).await?;
                    if ItemStatus::from_str(&item.status) == Some(ItemStatus::Archived) {
                        return Err(ServiceError::Conflict(format!(
                            "Item {} is archived; stock cannot be allocated",
                            item_id
                        )));
                    }

                    let snapshot = availability::batch_availability(txn, item_id).await?;
                    let plan = fefo::select_batches(&snapshot, quantity).map_err(|shortfall| {
                        ServiceError::InsufficientStock(format!(
                            "Item {}: requested {}, available {}",
                            item_id, shortfall.requested, shortfall.available
                        ))
                    })?;

                    let now = Utc::now();
                    let mut allocations = Vec::with_capacity(plan.len());
                    for draw in plan {
                        let created = allocation::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            item_id: Set(item_id),
                            batch_id: Set(draw.batch_id),
                            quantity: Set(draw.quantity),
                            reserved_for: Set(reference.clone()),
                            status: Set(AllocationStatus::Active.as_str().to_string()),
                            created_at: Set(now),
                            updated_at: Set(None),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        let remaining = snapshot
                            .iter()
                            .find(|b| b.batch_id == draw.batch_id)
                            .map(|b| b.quantity_remaining)
                            .ok_or_else(|| {
                                ServiceError::InternalError(format!(
                                    "Planned batch {} missing from availability snapshot",
                                    draw.batch_id
                                ))
                            })?;

                        stock_movement::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            organisation_id: Set(organisation_id),
                            item_id: Set(item_id),
                            batch_id: Set(draw.batch_id),
                            movement_type: Set(MovementType::Allocate.as_str().to_string()),
                            delta: Set(-draw.quantity),
                            resulting_remaining: Set(remaining),
                            actor_id: Set(actor_id),
                            reason: Set(Some(format!("reserved for {}", reference))),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                        allocations.push(created);
                    }

                    Ok(allocations)
                })
            })
            .await?;

        self.event_sender
            .emit(Event::StockAllocated {
                item_id,
                allocation_ids: allocations.iter().map(|a| a.id).collect(),
                quantity,
                reserved_for: reference_for_event,
            })
            .await;
        info!(
            item_id = %item_id,
            quantity = quantity,
            holds = allocations.len(),
            "Allocated stock"
        );
        Ok(allocations)
    }

    /// Releases an ACTIVE hold, returning its quantity to availability
    /// immediately. Releasing a non-ACTIVE allocation is reported as a
    /// conflict so retries are safe but never double-credit.
    #[instrument(skip(self, ctx))]
    pub async fn release_allocated_stock(
        &self,
        ctx: &OrgContext,
        allocation_id: Uuid,
    ) -> Result<allocation::Model, ServiceError> {
        // Resolve the owning item first; the lock must be held before the
        // status check to avoid racing a concurrent release.
        let existing = Allocation::find_by_id(allocation_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Allocation {} not found", allocation_id))
            })?;
        let item_id = existing.item_id;

        load_item_scoped(self.db.as_ref(), ctx.organisation_id, item_id)
            .await
            .map_err(|_| {
                ServiceError::NotFound(format!("Allocation {} not found", allocation_id))
            })?;

        let _guard = self.locks.acquire(item_id).await;
        let organisation_id = ctx.organisation_id;
        let actor_id = ctx.actor_id;

        let released = self
            .db
            .transaction::<_, allocation::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let current = Allocation::find_by_id(allocation_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Allocation {} not found",
                                allocation_id
                            ))
                        })?;

                    if AllocationStatus::from_str(&current.status)
                        != Some(AllocationStatus::Active)
                    {
                        return Err(ServiceError::Conflict(format!(
                            "Allocation {} is already {}",
                            allocation_id,
                            current.status.to_lowercase()
                        )));
                    }

                    let batch = Batch::find_by_id(current.batch_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::InternalError(format!(
                                "Allocation {} references missing batch {}",
                                allocation_id, current.batch_id
                            ))
                        })?;

                    let now = Utc::now();
                    let quantity = current.quantity;
                    let batch_id = current.batch_id;

                    let mut active: allocation::ActiveModel = current.into();
                    active.status = Set(AllocationStatus::Released.as_str().to_string());
                    active.updated_at = Set(Some(now));
                    let released = active.update(txn).await.map_err(ServiceError::db_error)?;

                    stock_movement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        organisation_id: Set(organisation_id),
                        item_id: Set(item_id),
                        batch_id: Set(batch_id),
                        movement_type: Set(MovementType::Release.as_str().to_string()),
                        delta: Set(quantity),
                        resulting_remaining: Set(batch.quantity_remaining),
                        actor_id: Set(actor_id),
                        reason: Set(None),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(released)
                })
            })
            .await?;

        self.event_sender
            .emit(Event::AllocationReleased {
                item_id,
                allocation_id,
                quantity: released.quantity,
            })
            .await;
        info!(
            allocation_id = %allocation_id,
            item_id = %item_id,
            "Released allocated stock"
        );
        Ok(released)
    }
}
