use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Sends domain events to the in-process event task. Events are
/// best-effort notifications; delivery failure never fails the operation
/// that produced them.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget send that logs on failure instead of surfacing it.
    pub async fn emit(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropped domain event");
        }
    }
}

/// Domain events emitted by the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    BatchReceived {
        item_id: Uuid,
        batch_id: Uuid,
        quantity: i32,
        expiry_date: Option<NaiveDate>,
    },
    StockConsumed {
        item_id: Uuid,
        batch_ids: Vec<Uuid>,
        quantity: i32,
    },
    StockAdjusted {
        item_id: Uuid,
        batch_id: Uuid,
        delta: i32,
        new_remaining: i32,
    },
    StockAllocated {
        item_id: Uuid,
        allocation_ids: Vec<Uuid>,
        quantity: i32,
        reserved_for: String,
    },
    AllocationReleased {
        item_id: Uuid,
        allocation_id: Uuid,
        quantity: i32,
    },
    LowStockDetected {
        item_id: Uuid,
        available: i32,
        reorder_threshold: i32,
    },
    ItemArchived {
        item_id: Uuid,
    },
}

/// Drains the event channel, logging each event. Runs for the lifetime of
/// the server; ends when all senders are dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::LowStockDetected {
                item_id,
                available,
                reorder_threshold,
            } => {
                warn!(
                    item_id = %item_id,
                    available = available,
                    reorder_threshold = reorder_threshold,
                    "Item below reorder threshold"
                );
            }
            other => {
                info!(event = ?other, "Domain event");
            }
        }
    }
    info!("Event channel closed; event task exiting");
}
