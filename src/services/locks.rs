use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed per-item mutex map. Every ledger-mutating operation acquires the
/// item's lock before opening its transaction, so two operations on the
/// same item can never act on the same availability snapshot. Operations
/// on different items proceed in parallel.
#[derive(Debug, Default)]
pub struct ItemLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, item_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(item_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[tokio::test]
    async fn same_item_serializes() {
        let locks = Arc::new(ItemLocks::new());
        let item = Uuid::new_v4();
        let in_section = Arc::new(AtomicI32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let locks = locks.clone();
            let in_section = in_section.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire(item).await;
                // Nobody else may be inside the critical section.
                assert_eq!(in_section.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
    }

    #[tokio::test]
    async fn different_items_do_not_block() {
        let locks = ItemLocks::new();
        let a = locks.acquire(Uuid::new_v4()).await;
        // Acquiring a different item's lock must not deadlock while `a` is held.
        let b = locks.acquire(Uuid::new_v4()).await;
        drop(a);
        drop(b);
    }
}
