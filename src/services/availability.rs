//! Availability snapshots computed inside the caller's transaction.
//!
//! `available` is never stored; it is always derived from batches and
//! ACTIVE allocations in the same transactional scope that mutates them.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::allocation::{self, AllocationStatus, Entity as Allocation};
use crate::entities::batch::{self, Entity as Batch};
use crate::errors::ServiceError;
use crate::services::fefo::BatchAvailability;

/// Loads the batches of an item together with each batch's ACTIVE
/// allocation total, in the form the FEFO planner consumes.
pub async fn batch_availability<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
) -> Result<Vec<BatchAvailability>, ServiceError> {
    let batches = Batch::find()
        .filter(batch::Column::ItemId.eq(item_id))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let allocated = active_allocation_totals(conn, item_id).await?;

    Ok(batches
        .into_iter()
        .map(|b| BatchAvailability {
            batch_id: b.id,
            expiry_date: b.expiry_date,
            received_at: b.received_at,
            quantity_remaining: b.quantity_remaining,
            quantity_allocated: allocated.get(&b.id).copied().unwrap_or(0),
        })
        .collect())
}

/// ACTIVE allocation quantity per batch for one item.
pub async fn active_allocation_totals<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
) -> Result<HashMap<Uuid, i32>, ServiceError> {
    let allocations = Allocation::find()
        .filter(allocation::Column::ItemId.eq(item_id))
        .filter(allocation::Column::Status.eq(AllocationStatus::Active.as_str()))
        .all(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let mut totals: HashMap<Uuid, i32> = HashMap::new();
    for alloc in allocations {
        *totals.entry(alloc.batch_id).or_insert(0) += alloc.quantity;
    }
    Ok(totals)
}

/// Item-level availability: sum of remaining minus sum of ACTIVE
/// allocations.
pub async fn item_available<C: ConnectionTrait>(
    conn: &C,
    item_id: Uuid,
) -> Result<i32, ServiceError> {
    let snapshot = batch_availability(conn, item_id).await?;
    Ok(snapshot
        .iter()
        .map(|b| b.quantity_remaining - b.quantity_allocated)
        .sum())
}
