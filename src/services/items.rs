//! Item catalog: identity, unit of measure, reorder threshold, lifecycle.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::OrgContext;
use crate::entities::batch::{self, Entity as Batch};
use crate::entities::item::{self, Entity as Item, ItemStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::availability;
use crate::services::fefo;
use crate::services::locks::ItemLocks;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateItemInput {
    pub name: String,
    pub category: Option<String>,
    pub unit_of_measure: String,
    pub reorder_threshold: i32,
}

/// Partial update. `organisation_id` and `status` are deliberately absent:
/// the former is immutable, the latter changes only through the transition
/// operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_of_measure: Option<String>,
    pub reorder_threshold: Option<i32>,
}

/// An item plus its batches in FEFO order, the order consumption and
/// allocation will drain them.
#[derive(Debug, Clone, Serialize)]
pub struct ItemWithBatches {
    pub item: item::Model,
    pub batches: Vec<batch::Model>,
}

/// Loads an item scoped to the caller's organisation.
pub(crate) async fn load_item_scoped<C: ConnectionTrait>(
    conn: &C,
    organisation_id: Uuid,
    item_id: Uuid,
) -> Result<item::Model, ServiceError> {
    Item::find_by_id(item_id)
        .filter(item::Column::OrganisationId.eq(organisation_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Item {} not found", item_id)))
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Item name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_unit_of_measure(uom: &str) -> Result<(), ServiceError> {
    if uom.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "Unit of measure cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_reorder_threshold(threshold: i32) -> Result<(), ServiceError> {
    if threshold < 0 {
        return Err(ServiceError::ValidationError(
            "Reorder threshold cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// Service for managing the item catalog.
#[derive(Clone)]
pub struct ItemCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    locks: Arc<ItemLocks>,
}

impl ItemCatalogService {
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

    #[instrument(skip(self, ctx, input))]
    pub async fn create_item(
        &self,
        ctx: &OrgContext,
        input: CreateItemInput,
    ) -> Result<item::Model, ServiceError> {
        validate_name(&input.name)?;
        validate_unit_of_measure(&input.unit_of_measure)?;
        validate_reorder_threshold(input.reorder_threshold)?;

        let now = Utc::now();
        let model = item::ActiveModel {
            id: Set(Uuid::new_v4()),
            organisation_id: Set(ctx.organisation_id),
            name: Set(input.name.trim().to_string()),
            category: Set(input.category),
            unit_of_measure: Set(input.unit_of_measure.trim().to_string()),
            reorder_threshold: Set(input.reorder_threshold),
            status: Set(ItemStatus::Active.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        info!(item_id = %model.id, name = %model.name, "Created inventory item");
        Ok(model)
    }

    #[instrument(skip(self, ctx, patch))]
    pub async fn update_item(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
        patch: UpdateItemInput,
    ) -> Result<item::Model, ServiceError> {
        let existing = load_item_scoped(self.db.as_ref(), ctx.organisation_id, item_id).await?;

        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(uom) = &patch.unit_of_measure {
            validate_unit_of_measure(uom)?;
        }
        if let Some(threshold) = patch.reorder_threshold {
            validate_reorder_threshold(threshold)?;
        }

        let mut active: item::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(category) = patch.category {
            active.category = Set(Some(category));
        }
        if let Some(uom) = patch.unit_of_measure {
            active.unit_of_measure = Set(uom.trim().to_string());
        }
        if let Some(threshold) = patch.reorder_threshold {
            active.reorder_threshold = Set(threshold);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(updated)
    }

    /// ACTIVE -> HIDDEN. Hiding an already hidden item is a no-op.
    #[instrument(skip(self, ctx))]
    pub async fn hide_item(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        self.transition(ctx, item_id, ItemStatus::Hidden).await
    }

    /// HIDDEN -> ACTIVE. Activating an already active item is a no-op.
    #[instrument(skip(self, ctx))]
    pub async fn activate_item(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        self.transition(ctx, item_id, ItemStatus::Active).await
    }

    async fn transition(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
        target: ItemStatus,
    ) -> Result<item::Model, ServiceError> {
        // Status changes share the item lock with stock mutations, so a
        // transition cannot interleave with a consumption or batch receipt
        // checking the status.
        let _guard = self.locks.acquire(item_id).await;
        let existing = load_item_scoped(self.db.as_ref(), ctx.organisation_id, item_id).await?;

        if ItemStatus::from_str(&existing.status) == Some(ItemStatus::Archived) {
            return Err(ServiceError::Conflict(format!(
                "Item {} is archived; archived items cannot change status",
                item_id
            )));
        }

        let mut active: item::ActiveModel = existing.into();
        active.status = Set(target.as_str().to_string());
        active.updated_at = Set(Utc::now());
        let updated = active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(updated)
    }

    /// Archives an item. Rejected while any stock is available; callers
    /// must consume, adjust away, or release holds first. Terminal.
    #[instrument(skip(self, ctx))]
    pub async fn archive_item(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        let _guard = self.locks.acquire(item_id).await;
        let organisation_id = ctx.organisation_id;

        let updated = self
            .db
            .transaction::<_, item::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let existing = load_item_scoped(txn, organisation_id, item_id).await?;

                    if ItemStatus::from_str(&existing.status) == Some(ItemStatus::Archived) {
                        return Err(ServiceError::Conflict(format!(
                            "Item {} is already archived",
                            item_id
                        )));
                    }

                    let available = availability::item_available(txn, item_id).await?;
                    if available > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Cannot archive item {} with {} available; consume or release stock first",
                            item_id, available
                        )));
                    }

                    let mut active: item::ActiveModel = existing.into();
                    active.status = Set(ItemStatus::Archived.as_str().to_string());
                    active.updated_at = Set(Utc::now());
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await?;

        self.event_sender
            .emit(Event::ItemArchived { item_id })
            .await;
        info!(item_id = %item_id, "Archived inventory item");
        Ok(updated)
    }

    #[instrument(skip(self, ctx))]
    pub async fn list_items(
        &self,
        ctx: &OrgContext,
        status_filter: Option<ItemStatus>,
    ) -> Result<Vec<item::Model>, ServiceError> {
        let mut query = Item::find()
            .filter(item::Column::OrganisationId.eq(ctx.organisation_id))
            .order_by_asc(item::Column::Name);

        if let Some(status) = status_filter {
            query = query.filter(item::Column::Status.eq(status.as_str()));
        }

        query.all(self.db.as_ref()).await.map_err(ServiceError::db_error)
    }

    /// Returns the item plus its batches sorted the way consumption and
    /// allocation will drain them.
    #[instrument(skip(self, ctx))]
    pub async fn get_item_with_batches(
        &self,
        ctx: &OrgContext,
        item_id: Uuid,
    ) -> Result<ItemWithBatches, ServiceError> {
        let item = load_item_scoped(self.db.as_ref(), ctx.organisation_id, item_id).await?;

        let mut batches = Batch::find()
            .filter(batch::Column::ItemId.eq(item_id))
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        batches.sort_by_key(|b| fefo::sort_key(b.expiry_date, b.received_at, b.id));

        Ok(ItemWithBatches { item, batches })
    }
}
