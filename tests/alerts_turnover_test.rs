mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use common::{date, setup};
use vetstock_api::errors::ServiceError;

#[tokio::test]
async fn low_stock_boundary_is_strict() {
    let app = setup().await;
    let item = app.create_item("Boundary med", 10).await;
    app.add_batch(item, "B1", None, 10).await;

    // available == threshold: not flagged
    let alerts = app.services.alerts.low_stock_items(&app.ctx).await.unwrap();
    assert!(alerts.iter().all(|a| a.item_id != item));

    // available == 9: flagged
    app.services
        .consumption
        .consume_stock(&app.ctx, item, 1, None)
        .await
        .unwrap();
    let alerts = app.services.alerts.low_stock_items(&app.ctx).await.unwrap();
    let alert = alerts
        .iter()
        .find(|a| a.item_id == item)
        .expect("item should be flagged");
    assert_eq!(alert.available, 9);
    assert_eq!(alert.reorder_threshold, 10);
}

#[tokio::test]
async fn low_stock_counts_active_holds_against_availability() {
    let app = setup().await;
    let item = app.create_item("Held med", 10).await;
    app.add_batch(item, "B1", None, 12).await;

    app.services
        .allocation
        .allocate_stock(&app.ctx, item, 4, "order-1".to_string())
        .await
        .unwrap();

    let alerts = app.services.alerts.low_stock_items(&app.ctx).await.unwrap();
    let alert = alerts
        .iter()
        .find(|a| a.item_id == item)
        .expect("held stock should flag");
    assert_eq!(alert.available, 8);
}

#[tokio::test]
async fn archived_items_never_alert() {
    let app = setup().await;
    let item = app.create_item("Retired med", 5).await;
    // Zero stock, threshold 5: would alert if not archived
    app.services.items.archive_item(&app.ctx, item).await.unwrap();

    let alerts = app.services.alerts.low_stock_items(&app.ctx).await.unwrap();
    assert!(alerts.iter().all(|a| a.item_id != item));
}

#[tokio::test]
async fn expiring_window_selects_only_dated_stock_inside_it() {
    let app = setup().await;
    let item = app.create_item("Windowed med", 0).await;
    let today = Utc::now().date_naive();

    let soon = app
        .add_batch(item, "SOON", Some(today + Duration::days(10)), 5)
        .await;
    app.add_batch(item, "FAR", Some(today + Duration::days(60)), 5)
        .await;
    app.add_batch(item, "NEVER", None, 5).await;
    let drained = app
        .add_batch(item, "DRAINED", Some(today + Duration::days(5)), 2)
        .await;
    app.services
        .consumption
        .consume_stock(&app.ctx, item, 2, None)
        .await
        .unwrap();
    // FEFO drained the 5-day batch first
    assert_eq!(app.batch(drained).await.quantity_remaining, 0);

    let groups = app
        .services
        .alerts
        .expiring_batches(&app.ctx, 30)
        .await
        .unwrap();

    let group = groups
        .iter()
        .find(|g| g.item_id == item)
        .expect("item has expiring stock");
    let ids: Vec<_> = group.batches.iter().map(|b| b.batch_id).collect();
    assert_eq!(ids, vec![soon]);
    assert_eq!(group.batches[0].quantity_remaining, 5);
    assert_eq!(group.batches[0].days_until_expiry, 10);
}

#[tokio::test]
async fn turnover_ratio_over_one_receive_and_consume() {
    let app = setup().await;
    let item = app.create_item("Turnover med", 0).await;
    let start = Utc::now() - Duration::hours(1);

    app.add_batch(item, "B1", Some(date(2026, 1, 1)), 100).await;
    app.services
        .consumption
        .consume_stock(&app.ctx, item, 20, Some("consults".to_string()))
        .await
        .unwrap();

    let end = Utc::now() + Duration::hours(1);
    let report = app
        .services
        .analytics
        .inventory_turnover(&app.ctx, start, end)
        .await
        .unwrap();

    let row = report
        .items
        .iter()
        .find(|r| r.item_id == item)
        .expect("item row");
    // Nothing on hand at window start; 80 available at its end
    assert_eq!(row.available_at_start, 0);
    assert_eq!(row.available_at_end, 80);
    assert_eq!(row.consumed, 20);
    assert_eq!(row.average_available, 40.0);
    assert_eq!(row.turnover_ratio, Some(0.5));

    assert_eq!(report.aggregate.consumed, 20);
    assert_eq!(report.aggregate.turnover_ratio, Some(0.5));
}

#[tokio::test]
async fn turnover_is_null_when_nothing_on_hand() {
    let app = setup().await;
    let item = app.create_item("Dormant med", 0).await;

    let report = app
        .services
        .analytics
        .inventory_turnover(
            &app.ctx,
            Utc::now() - Duration::days(30),
            Utc::now() + Duration::hours(1),
        )
        .await
        .unwrap();

    let row = report
        .items
        .iter()
        .find(|r| r.item_id == item)
        .expect("item row");
    assert_eq!(row.consumed, 0);
    assert_eq!(row.turnover_ratio, None);
}

#[tokio::test]
async fn turnover_rejects_inverted_period() {
    let app = setup().await;
    let now = Utc::now();
    let err = app
        .services
        .analytics
        .inventory_turnover(&app.ctx, now, now - Duration::days(1))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn released_holds_do_not_skew_turnover_availability() {
    let app = setup().await;
    let item = app.create_item("Round-trip med", 0).await;
    let start = Utc::now() - Duration::hours(1);

    app.add_batch(item, "B1", None, 50).await;
    let holds = app
        .services
        .allocation
        .allocate_stock(&app.ctx, item, 10, "order-r".to_string())
        .await
        .unwrap();
    app.services
        .allocation
        .release_allocated_stock(&app.ctx, holds[0].id)
        .await
        .unwrap();

    let report = app
        .services
        .analytics
        .inventory_turnover(&app.ctx, start, Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let row = report.items.iter().find(|r| r.item_id == item).unwrap();
    // Allocate and release cancel out in the replay
    assert_eq!(row.available_at_end, 50);
    assert_eq!(row.consumed, 0);
}
