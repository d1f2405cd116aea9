//! Property-based tests for the FEFO batch planner.
//!
//! These use proptest to verify planner invariants across a wide range of
//! inputs, catching edge cases the example-based tests might miss.

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use vetstock_api::services::fefo::{select_batches, sort_key, BatchAvailability};

fn batch_strategy() -> impl Strategy<Value = BatchAvailability> {
    (
        proptest::option::of(0i64..3000),
        0i64..1_000_000,
        0i32..500,
        0i32..500,
    )
        .prop_map(|(expiry_offset, received_offset, remaining, held)| {
            let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
            BatchAvailability {
                batch_id: Uuid::new_v4(),
                expiry_date: expiry_offset
                    .map(|days| epoch + chrono::Duration::days(days)),
                received_at: Utc.timestamp_opt(1_577_836_800 + received_offset, 0).unwrap(),
                quantity_remaining: remaining,
                // Allocations never exceed remaining in any reachable state
                quantity_allocated: held.min(remaining),
            }
        })
}

fn batches_strategy() -> impl Strategy<Value = Vec<BatchAvailability>> {
    proptest::collection::vec(batch_strategy(), 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn successful_plans_cover_exactly_the_request(
        batches in batches_strategy(),
        requested in 1i32..2000,
    ) {
        let total_available: i32 = batches.iter().map(BatchAvailability::available).sum();

        match select_batches(&batches, requested) {
            Ok(draws) => {
                prop_assert!(total_available >= requested);
                let drawn: i32 = draws.iter().map(|d| d.quantity).sum();
                prop_assert_eq!(drawn, requested);
            }
            Err(shortfall) => {
                prop_assert!(total_available < requested);
                prop_assert_eq!(shortfall.requested, requested);
                prop_assert_eq!(shortfall.available, total_available);
            }
        }
    }

    #[test]
    fn draws_never_exceed_a_batch_availability(
        batches in batches_strategy(),
        requested in 1i32..2000,
    ) {
        if let Ok(draws) = select_batches(&batches, requested) {
            for draw in &draws {
                let batch = batches.iter().find(|b| b.batch_id == draw.batch_id).unwrap();
                prop_assert!(draw.quantity > 0);
                prop_assert!(draw.quantity <= batch.available());
            }

            // No batch is drawn twice
            let mut ids: Vec<_> = draws.iter().map(|d| d.batch_id).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), draws.len());
        }
    }

    #[test]
    fn draws_respect_fefo_order(
        batches in batches_strategy(),
        requested in 1i32..2000,
    ) {
        if let Ok(draws) = select_batches(&batches, requested) {
            let keys: Vec<_> = draws
                .iter()
                .map(|d| {
                    let b = batches.iter().find(|b| b.batch_id == d.batch_id).unwrap();
                    sort_key(b.expiry_date, b.received_at, b.batch_id)
                })
                .collect();
            let mut sorted = keys.clone();
            sorted.sort();
            prop_assert_eq!(keys, sorted);
        }
    }

    #[test]
    fn applying_a_plan_preserves_conservation(
        batches in batches_strategy(),
        requested in 1i32..2000,
    ) {
        if let Ok(draws) = select_batches(&batches, requested) {
            // Simulate the consumption the plan describes
            let mut after = batches.clone();
            for draw in &draws {
                let batch = after.iter_mut().find(|b| b.batch_id == draw.batch_id).unwrap();
                batch.quantity_remaining -= draw.quantity;
            }
            for batch in &after {
                prop_assert!(batch.quantity_remaining >= 0);
                // Consumption only ever draws from the unheld portion
                prop_assert!(batch.quantity_remaining >= batch.quantity_allocated);
            }
        }
    }

    #[test]
    fn earlier_expiry_is_never_left_while_later_is_drawn(
        batches in batches_strategy(),
        requested in 1i32..2000,
    ) {
        if let Ok(draws) = select_batches(&batches, requested) {
            // Every batch with availability that was skipped entirely must
            // sort after every batch that was drawn from partially.
            if let Some(last_draw) = draws.last() {
                let last = batches.iter().find(|b| b.batch_id == last_draw.batch_id).unwrap();
                let last_key = sort_key(last.expiry_date, last.received_at, last.batch_id);
                for b in &batches {
                    let drawn = draws.iter().any(|d| d.batch_id == b.batch_id);
                    if !drawn && b.available() > 0 {
                        let key = sort_key(b.expiry_date, b.received_at, b.batch_id);
                        prop_assert!(key > last_key);
                    }
                }
            }
        }
    }
}
