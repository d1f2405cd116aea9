//! Batch ledger: receiving, amending, and retiring stock batches.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::OrgContext;
use crate::entities::allocation::{self, AllocationStatus, Entity as Allocation};
use crate::entities::batch::{self, Entity as Batch};
use crate::entities::item::ItemStatus;
use crate::entities::stock_movement::{self, MovementType};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::items::load_item_scoped;
use crate::services::locks::ItemLocks;

#[derive(Debug, Clone, Deserialize)]
pub struct AddBatchInput {
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub quantity_received: i32,
    pub unit_cost: Option<Decimal>,
}

/// Partial update of batch metadata. Quantity fields are deliberately
/// absent: every quantity change goes through `adjust_stock` so it is
/// journaled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBatchInput {
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub unit_cost: Option<Decimal>,
}

/// Loads a batch and verifies it belongs to the caller's organisation.
pub(crate) async fn load_batch_scoped(
    db: &DatabaseConnection,
    organisation_id: Uuid,
    batch_id: Uuid,
) -> Result<batch::Model, ServiceError> {
    let batch = Batch::find_by_id(batch_id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Batch {} not found", batch_id)))?;

    // Ownership check goes through the item; a batch of another
    // organisation reads as not found.
    load_item_scoped(db, organisation_id, batch.item_id)
        .await
        .map_err(|_| ServiceError::NotFound(format!("Batch {} not found", batch_id)))?;

    Ok(batch)
}

/// Service for managing stock batches.
#[derive(Clone)]
pub struct BatchLedgerService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    locks: Arc<ItemLocks>,
}

impl BatchLedgerService {
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

    /// Receives a new batch for an ACTIVE item and journals the receipt in
    /// the same transaction.
    #[instrument(skip(self, ctx, input))]
    pub async fn add_batch(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
        input: AddBatchInput,
    ) -> Result<batch::Model, ServiceError> {
        if input.batch_number.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Batch number cannot be empty".to_string(),
            ));
        }
        if input.quantity_received <= 0 {
            return Err(ServiceError::ValidationError(
                "Quantity received must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(item_id).await;
        let organisation_id = ctx.organisation_id;
        let actor_id = ctx.actor_id;

        let created = self
            .db
            .transaction::<_, batch::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let item = load_item_scoped(txn, organisation_id, item_id).await?;
                    if ItemStatus::from_str(&item.status) != Some(ItemStatus::Active) {
                        return Err(ServiceError::Conflict(format!(
                            "Item {} is not active; batches can only be added to active items",
                            item_id
                        )));
                    }

                    let now = Utc::now();
                    let created = batch::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        item_id: Set(item_id),
                        batch_number: Set(input.batch_number.trim().to_string()),
                        expiry_date: Set(input.expiry_date),
                        quantity_received: Set(input.quantity_received),
                        quantity_remaining: Set(input.quantity_received),
                        unit_cost: Set(input.unit_cost),
                        received_at: Set(now),
                        created_at: Set(now),
                        updated_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    stock_movement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        organisation_id: Set(organisation_id),
                        item_id: Set(item_id),
                        batch_id: Set(created.id),
                        movement_type: Set(MovementType::Receive.as_str().to_string()),
                        delta: Set(created.quantity_received),
                        resulting_remaining: Set(created.quantity_remaining),
                        actor_id: Set(actor_id),
                        reason: Set(None),
                        created_at: Set(now),
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(created)
                })
            })
            .await?;

        self.event_sender
            .emit(Event::BatchReceived {
                item_id,
                batch_id: created.id,
                quantity: created.quantity_received,
                expiry_date: created.expiry_date,
            })
            .await;
        info!(
            item_id = %item_id,
            batch_id = %created.id,
            quantity = created.quantity_received,
            "Received stock batch"
        );
        Ok(created)
    }

    #[instrument(skip(self, ctx, patch))]
    pub async fn update_batch(
        &self,
        ctx: &OrgContext,
        batch_id: Uuid,
        patch: UpdateBatchInput,
    ) -> Result<batch::Model, ServiceError> {
        let existing = load_batch_scoped(self.db.as_ref(), ctx.organisation_id, batch_id).await?;

        if let Some(batch_number) = &patch.batch_number {
            if batch_number.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Batch number cannot be empty".to_string(),
                ));
            }
        }

        let mut active: batch::ActiveModel = existing.into();
        if let Some(batch_number) = patch.batch_number {
            active.batch_number = Set(batch_number.trim().to_string());
        }
        if let Some(expiry_date) = patch.expiry_date {
            active.expiry_date = Set(Some(expiry_date));
        }
        if let Some(unit_cost) = patch.unit_cost {
            active.unit_cost = Set(Some(unit_cost));
        }
        active.updated_at = Set(Utc::now());

        active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Deletes a drained batch. Rejected while any quantity remains or an
    /// ACTIVE allocation still references the batch.
    #[instrument(skip(self, ctx))]
    pub async fn delete_batch(
        &self,
        ctx: &OrgContext,
        batch_id: Uuid,
    ) -> Result<(), ServiceError> {
        let existing = load_batch_scoped(self.db.as_ref(), ctx.organisation_id, batch_id).await?;

        let _guard = self.locks.acquire(existing.item_id).await;

        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let batch = Batch::find_by_id(batch_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Batch {} not found", batch_id))
                        })?;

                    if batch.quantity_remaining != 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Batch {} still has {} remaining; adjust to zero before deleting",
                            batch_id, batch.quantity_remaining
                        )));
                    }

                    let active_holds = Allocation::find()
                        .filter(allocation::Column::BatchId.eq(batch_id))
                        .filter(
                            allocation::Column::Status.eq(AllocationStatus::Active.as_str()),
                        )
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if active_holds > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Batch {} is referenced by {} active allocation(s)",
                            batch_id, active_holds
                        )));
                    }

                    batch.delete(txn).await.map_err(ServiceError::db_error)?;
                    Ok(())
                })
            })
            .await?;

        info!(batch_id = %batch_id, "Deleted stock batch");
        Ok(())
    }
}
