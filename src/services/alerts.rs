//! Read-only alert projections over catalog + batch state.

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::OrgContext;
use crate::entities::allocation::{self, AllocationStatus, Entity as Allocation};
use crate::entities::batch::{self, Entity as Batch};
use crate::entities::item::{self, Entity as Item, ItemStatus};
use crate::errors::ServiceError;

/// An item whose availability has fallen below its reorder threshold.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LowStockAlert {
    pub item_id: Uuid,
    pub name: String,
    pub unit_of_measure: String,
    pub status: String,
    pub reorder_threshold: i32,
    pub available: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpiringBatchAlert {
    pub batch_id: Uuid,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub quantity_remaining: i32,
    pub days_until_expiry: i64,
}

/// Batches expiring inside the requested window, grouped per item.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExpiringItemBatches {
    pub item_id: Uuid,
    pub name: String,
    pub batches: Vec<ExpiringBatchAlert>,
}

/// Service deriving low-stock and expiry alerts.
#[derive(Clone)]
pub struct AlertService {
    db: Arc<DatabaseConnection>,
}

impl AlertService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Items (excluding archived) whose available quantity is strictly
    /// below their reorder threshold. An item sitting exactly at its
    /// threshold is not flagged.
    #[instrument(skip(self, ctx))]
    pub async fn low_stock_items(
        &self,
        ctx: &OrgContext,
    ) -> Result<Vec<LowStockAlert>, ServiceError> {
        let db = self.db.as_ref();

        let items = Item::find()
            .filter(item::Column::OrganisationId.eq(ctx.organisation_id))
            .filter(item::Column::Status.ne(ItemStatus::Archived.as_str()))
            .order_by_asc(item::Column::Name)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        if items.is_empty() {
            return Ok(Vec::new());
        }
        let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();

        let batches = Batch::find()
            .filter(batch::Column::ItemId.is_in(item_ids.clone()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let allocations = Allocation::find()
            .filter(allocation::Column::ItemId.is_in(item_ids))
            .filter(allocation::Column::Status.eq(AllocationStatus::Active.as_str()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut remaining_by_item: HashMap<Uuid, i32> = HashMap::new();
        for b in batches {
            *remaining_by_item.entry(b.item_id).or_insert(0) += b.quantity_remaining;
        }
        let mut held_by_item: HashMap<Uuid, i32> = HashMap::new();
        for a in allocations {
            *held_by_item.entry(a.item_id).or_insert(0) += a.quantity;
        }

        Ok(items
            .into_iter()
            .filter_map(|i| {
                let available = remaining_by_item.get(&i.id).copied().unwrap_or(0)
                    - held_by_item.get(&i.id).copied().unwrap_or(0);
                if available < i.reorder_threshold {
                    Some(LowStockAlert {
                        item_id: i.id,
                        name: i.name,
                        unit_of_measure: i.unit_of_measure,
                        status: i.status,
                        reorder_threshold: i.reorder_threshold,
                        available,
                    })
                } else {
                    None
                }
            })
            .collect())
    }

    /// Batches with stock remaining that expire within `window_days` from
    /// today, grouped by item and ordered soonest-first.
    #[instrument(skip(self, ctx))]
    pub async fn expiring_batches(
        &self,
        ctx: &OrgContext,
        window_days: u32,
    ) -> Result<Vec<ExpiringItemBatches>, ServiceError> {
        let db = self.db.as_ref();
        let today = Utc::now().date_naive();
        let horizon = today + Duration::days(i64::from(window_days));

        let items = Item::find()
            .filter(item::Column::OrganisationId.eq(ctx.organisation_id))
            .order_by_asc(item::Column::Name)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        if items.is_empty() {
            return Ok(Vec::new());
        }
        let item_ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();

        let batches = Batch::find()
            .filter(batch::Column::ItemId.is_in(item_ids))
            .filter(batch::Column::QuantityRemaining.gt(0))
            .filter(batch::Column::ExpiryDate.is_not_null())
            .filter(batch::Column::ExpiryDate.gte(today))
            .filter(batch::Column::ExpiryDate.lte(horizon))
            .order_by_asc(batch::Column::ExpiryDate)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        let mut grouped: HashMap<Uuid, Vec<ExpiringBatchAlert>> = HashMap::new();
        for b in batches {
            // Filtered on is_not_null above
            if let Some(expiry) = b.expiry_date {
                grouped.entry(b.item_id).or_default().push(ExpiringBatchAlert {
                    batch_id: b.id,
                    batch_number: b.batch_number,
                    expiry_date: expiry,
                    quantity_remaining: b.quantity_remaining,
                    days_until_expiry: (expiry - today).num_days(),
                });
            }
        }

        Ok(items
            .into_iter()
            .filter_map(|i| {
                grouped.remove(&i.id).map(|batches| ExpiringItemBatches {
                    item_id: i.id,
                    name: i.name,
                    batches,
                })
            })
            .collect())
    }
}
