mod common;

use common::{date, setup};
use vetstock_api::services::availability;

// Twenty tasks race to consume one unit each from a stock of ten. The
// per-item lock must let exactly ten through; the rest fail with
// insufficient stock and mutate nothing.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumption_never_oversells() {
    let app = setup().await;
    let item = app.create_item("Contested vaccine", 0).await;
    let batch = app.add_batch(item, "B1", Some(date(2026, 1, 1)), 10).await;

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let consumption = app.services.consumption.clone();
        let ctx = app.ctx.clone();
        tasks.push(tokio::spawn(async move {
            consumption.consume_stock(&ctx, item, 1, None).await.is_ok()
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }

    assert_eq!(successes, 10, "exactly 10 consumptions should succeed");
    assert_eq!(app.batch(batch).await.quantity_remaining, 0);
}

// Consumption racing allocation on the same item: the two paths share one
// availability snapshot discipline, so total successful draws can never
// exceed what was on hand.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn consume_and_allocate_share_one_availability_snapshot() {
    let app = setup().await;
    let item = app.create_item("Contested antibiotic", 0).await;
    app.add_batch(item, "B1", Some(date(2026, 1, 1)), 10).await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let services = app.services.clone();
        let ctx = app.ctx.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                services
                    .consumption
                    .consume_stock(&ctx, item, 1, None)
                    .await
                    .is_ok()
            } else {
                services
                    .allocation
                    .allocate_stock(&ctx, item, 1, format!("order-{}", i))
                    .await
                    .is_ok()
            }
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }

    assert_eq!(
        successes, 10,
        "ten units on hand allow exactly ten successful operations"
    );

    let available = availability::item_available(app.db.as_ref(), item)
        .await
        .unwrap();
    assert_eq!(available, 0);
    assert!(available >= 0, "conservation: availability never negative");
}

// Bulk sub-requests targeting one item apply in order, each independently
// atomic; the failing oversized request in the middle does not poison the
// later one.
#[tokio::test]
async fn bulk_requests_on_one_item_apply_in_order() {
    let app = setup().await;
    let item = app.create_item("Sequential syrup", 0).await;
    app.add_batch(item, "B1", None, 10).await;

    let requests = vec![
        vetstock_api::services::consumption::ConsumeRequest {
            item_id: item,
            quantity: 6,
            reason: None,
        },
        vetstock_api::services::consumption::ConsumeRequest {
            item_id: item,
            quantity: 100,
            reason: None,
        },
        vetstock_api::services::consumption::ConsumeRequest {
            item_id: item,
            quantity: 4,
            reason: None,
        },
    ];

    let outcomes = app
        .services
        .consumption
        .bulk_consume_stock(&app.ctx, requests)
        .await
        .unwrap();

    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);
    assert!(outcomes[2].success);
    assert_eq!(
        availability::item_available(app.db.as_ref(), item)
            .await
            .unwrap(),
        0
    );
}
