mod common;

use assert_matches::assert_matches;
use common::{date, setup};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use vetstock_api::entities::allocation::{self, AllocationStatus, Entity as Allocation};
use vetstock_api::errors::ServiceError;
use vetstock_api::services::availability;

#[tokio::test]
async fn allocation_reduces_availability_without_mutating_batches() {
    let app = setup().await;
    let item = app.create_item("Meloxicam", 0).await;
    let b1 = app.add_batch(item, "B1", Some(date(2025, 3, 1)), 10).await;
    let b2 = app.add_batch(item, "B2", Some(date(2025, 9, 1)), 5).await;

    app.services
        .allocation
        .allocate_stock(&app.ctx, item, 5, "order-x".to_string())
        .await
        .expect("allocate");

    // Raw remaining untouched, availability down by 5
    assert_eq!(app.batch(b1).await.quantity_remaining, 10);
    assert_eq!(app.batch(b2).await.quantity_remaining, 5);
    assert_eq!(
        availability::item_available(app.db.as_ref(), item)
            .await
            .unwrap(),
        10
    );

    // 12 > 10 available even though raw remaining sums to 15
    let err = app
        .services
        .consumption
        .consume_stock(&app.ctx, item, 12, None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));
}

#[tokio::test]
async fn allocate_release_round_trip_restores_availability() {
    let app = setup().await;
    let item = app.create_item("Carprofen chew", 0).await;
    app.add_batch(item, "B1", Some(date(2026, 1, 1)), 20).await;

    let before = availability::item_available(app.db.as_ref(), item)
        .await
        .unwrap();

    let allocations = app
        .services
        .allocation
        .allocate_stock(&app.ctx, item, 5, "orderX".to_string())
        .await
        .expect("allocate");
    assert_eq!(allocations.len(), 1);
    assert_eq!(
        availability::item_available(app.db.as_ref(), item)
            .await
            .unwrap(),
        before - 5
    );

    let released = app
        .services
        .allocation
        .release_allocated_stock(&app.ctx, allocations[0].id)
        .await
        .expect("release");
    assert_eq!(
        AllocationStatus::from_str(&released.status),
        Some(AllocationStatus::Released)
    );

    assert_eq!(
        availability::item_available(app.db.as_ref(), item)
            .await
            .unwrap(),
        before
    );
}

#[tokio::test]
async fn releasing_twice_conflicts_and_never_double_credits() {
    let app = setup().await;
    let item = app.create_item("Buprenorphine", 0).await;
    app.add_batch(item, "B1", None, 10).await;

    let allocations = app
        .services
        .allocation
        .allocate_stock(&app.ctx, item, 4, "surgery-2".to_string())
        .await
        .expect("allocate");
    let allocation_id = allocations[0].id;

    app.services
        .allocation
        .release_allocated_stock(&app.ctx, allocation_id)
        .await
        .expect("first release");

    let err = app
        .services
        .allocation
        .release_allocated_stock(&app.ctx, allocation_id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));

    // Credited exactly once
    assert_eq!(
        availability::item_available(app.db.as_ref(), item)
            .await
            .unwrap(),
        10
    );
}

#[tokio::test]
async fn allocation_shortfall_creates_no_partial_holds() {
    let app = setup().await;
    let item = app.create_item("Heartworm test kit", 0).await;
    app.add_batch(item, "B1", Some(date(2025, 1, 1)), 3).await;
    app.add_batch(item, "B2", Some(date(2025, 2, 1)), 3).await;

    let err = app
        .services
        .allocation
        .allocate_stock(&app.ctx, item, 10, "order-y".to_string())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    let holds = Allocation::find()
        .filter(allocation::Column::ItemId.eq(item))
        .all(app.db.as_ref())
        .await
        .unwrap();
    assert!(holds.is_empty());
}

#[tokio::test]
async fn allocation_follows_fefo_across_batches() {
    let app = setup().await;
    let item = app.create_item("Frontline spot-on", 0).await;
    let b1 = app.add_batch(item, "B1", Some(date(2025, 1, 1)), 10).await;
    let b2 = app.add_batch(item, "B2", Some(date(2025, 6, 1)), 20).await;

    let allocations = app
        .services
        .allocation
        .allocate_stock(&app.ctx, item, 12, "kennel-9".to_string())
        .await
        .expect("allocate");

    assert_eq!(allocations.len(), 2);
    assert_eq!(allocations[0].batch_id, b1);
    assert_eq!(allocations[0].quantity, 10);
    assert_eq!(allocations[1].batch_id, b2);
    assert_eq!(allocations[1].quantity, 2);
}

#[tokio::test]
async fn releasing_unknown_allocation_is_not_found() {
    let app = setup().await;
    let err = app
        .services
        .allocation
        .release_allocated_stock(&app.ctx, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn foreign_organisation_cannot_release_a_hold() {
    let app = setup().await;
    let item = app.create_item("Cerenia", 0).await;
    app.add_batch(item, "B1", None, 5).await;

    let allocations = app
        .services
        .allocation
        .allocate_stock(&app.ctx, item, 2, "order-z".to_string())
        .await
        .expect("allocate");

    let stranger = common::org_context();
    let err = app
        .services
        .allocation
        .release_allocated_stock(&stranger, allocations[0].id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}
