//! First-Expired-First-Out batch selection.
//!
//! The planner is a pure function shared by consumption and allocation so
//! both paths pick batches in exactly the same order, and by
//! `get_item_with_batches` so callers can preview that order.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// One batch's availability snapshot as seen inside the owning
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchAvailability {
    pub batch_id: Uuid,
    pub expiry_date: Option<NaiveDate>,
    pub received_at: DateTime<Utc>,
    pub quantity_remaining: i32,
    /// Sum of ACTIVE allocation quantities held against this batch.
    pub quantity_allocated: i32,
}

impl BatchAvailability {
    /// Quantity that can still be consumed or newly allocated from this
    /// batch. Allocations beyond remaining (transient states only) floor
    /// at zero.
    pub fn available(&self) -> i32 {
        (self.quantity_remaining - self.quantity_allocated).max(0)
    }
}

/// A planned draw against one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub quantity: i32,
}

/// Planner failure: the item cannot cover the requested quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub requested: i32,
    pub available: i32,
}

/// Ordering key: earliest expiry first, never-expiring batches last,
/// ties broken by receipt time then id so the order is total and stable.
pub fn sort_key(
    expiry_date: Option<NaiveDate>,
    received_at: DateTime<Utc>,
    id: Uuid,
) -> (bool, Option<NaiveDate>, DateTime<Utc>, Uuid) {
    (expiry_date.is_none(), expiry_date, received_at, id)
}

/// Plans draws over the given batches in FEFO order until `requested` is
/// covered. Returns `Shortfall` (and plans nothing) when total
/// availability is insufficient; callers translate that into their
/// all-or-nothing failure.
pub fn select_batches(
    batches: &[BatchAvailability],
    requested: i32,
) -> Result<Vec<BatchDraw>, Shortfall> {
    debug_assert!(requested > 0);

    let total_available: i32 = batches.iter().map(BatchAvailability::available).sum();
    if total_available < requested {
        return Err(Shortfall {
            requested,
            available: total_available,
        });
    }

    let mut ordered: Vec<&BatchAvailability> = batches.iter().collect();
    ordered.sort_by_key(|b| sort_key(b.expiry_date, b.received_at, b.batch_id));

    let mut draws = Vec::new();
    let mut outstanding = requested;
    for batch in ordered {
        if outstanding == 0 {
            break;
        }
        let take = batch.available().min(outstanding);
        if take == 0 {
            continue;
        }
        draws.push(BatchDraw {
            batch_id: batch.batch_id,
            quantity: take,
        });
        outstanding -= take;
    }

    Ok(draws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn batch(
        expiry: Option<(i32, u32, u32)>,
        received_day: u32,
        remaining: i32,
        allocated: i32,
    ) -> BatchAvailability {
        BatchAvailability {
            batch_id: Uuid::new_v4(),
            expiry_date: expiry.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            received_at: Utc
                .with_ymd_and_hms(2024, 1, received_day, 12, 0, 0)
                .unwrap(),
            quantity_remaining: remaining,
            quantity_allocated: allocated,
        }
    }

    #[test]
    fn earliest_expiry_drained_first() {
        let b1 = batch(Some((2024, 1, 1)), 1, 10, 0);
        let b2 = batch(Some((2024, 6, 1)), 1, 20, 0);
        let draws = select_batches(&[b2.clone(), b1.clone()], 15).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].batch_id, b1.batch_id);
        assert_eq!(draws[0].quantity, 10);
        assert_eq!(draws[1].batch_id, b2.batch_id);
        assert_eq!(draws[1].quantity, 5);
    }

    #[test]
    fn never_expiring_batches_come_last() {
        let perpetual = batch(None, 1, 50, 0);
        let dated = batch(Some((2030, 1, 1)), 5, 5, 0);
        let draws = select_batches(&[perpetual.clone(), dated.clone()], 10).unwrap();

        assert_eq!(draws[0].batch_id, dated.batch_id);
        assert_eq!(draws[0].quantity, 5);
        assert_eq!(draws[1].batch_id, perpetual.batch_id);
        assert_eq!(draws[1].quantity, 5);
    }

    #[test]
    fn equal_expiry_ties_break_by_receipt_time() {
        let newer = batch(Some((2025, 3, 1)), 20, 10, 0);
        let older = batch(Some((2025, 3, 1)), 2, 10, 0);
        let draws = select_batches(&[newer.clone(), older.clone()], 12).unwrap();

        assert_eq!(draws[0].batch_id, older.batch_id);
        assert_eq!(draws[0].quantity, 10);
        assert_eq!(draws[1].batch_id, newer.batch_id);
        assert_eq!(draws[1].quantity, 2);
    }

    #[test]
    fn allocated_quantity_reduces_what_a_batch_offers() {
        let held = batch(Some((2024, 2, 1)), 1, 10, 8);
        let free = batch(Some((2024, 5, 1)), 1, 10, 0);
        let draws = select_batches(&[held.clone(), free.clone()], 6).unwrap();

        assert_eq!(draws[0].batch_id, held.batch_id);
        assert_eq!(draws[0].quantity, 2);
        assert_eq!(draws[1].batch_id, free.batch_id);
        assert_eq!(draws[1].quantity, 4);
    }

    #[test]
    fn shortfall_plans_nothing() {
        let b = batch(Some((2024, 2, 1)), 1, 10, 4);
        let err = select_batches(&[b], 7).unwrap_err();
        assert_eq!(
            err,
            Shortfall {
                requested: 7,
                available: 6
            }
        );
    }

    #[test]
    fn fully_held_batches_are_skipped() {
        let held = batch(Some((2024, 2, 1)), 1, 5, 5);
        let free = batch(Some((2024, 5, 1)), 1, 5, 0);
        let draws = select_batches(&[held, free.clone()], 5).unwrap();

        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].batch_id, free.batch_id);
        assert_eq!(draws[0].quantity, 5);
    }
}
