pub mod alerts;
pub mod analytics;
pub mod batches;
pub mod items;
pub mod stock;

use crate::events::EventSender;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<crate::services::items::ItemCatalogService>,
    pub batches: Arc<crate::services::batches::BatchLedgerService>,
    pub consumption: Arc<crate::services::consumption::ConsumptionService>,
    pub allocation: Arc<crate::services::allocation::AllocationService>,
    pub alerts: Arc<crate::services::alerts::AlertService>,
    pub analytics: Arc<crate::services::analytics::TurnoverService>,
}

impl AppServices {
    /// Builds the service container. All mutating services share one
    /// per-item lock map so consumption, allocation, and batch mutations
    /// serialize against each other.
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        let locks = Arc::new(crate::services::locks::ItemLocks::new());

        Self {
            items: Arc::new(crate::services::items::ItemCatalogService::new(
                db.clone(),
                event_sender.clone(),
                locks.clone(),
            )),
            batches: Arc::new(crate::services::batches::BatchLedgerService::new(
                db.clone(),
                event_sender.clone(),
                locks.clone(),
            )),
            consumption: Arc::new(crate::services::consumption::ConsumptionService::new(
                db.clone(),
                event_sender.clone(),
                locks.clone(),
            )),
            allocation: Arc::new(crate::services::allocation::AllocationService::new(
                db.clone(),
                event_sender,
                locks,
            )),
            alerts: Arc::new(crate::services::alerts::AlertService::new(db.clone())),
            analytics: Arc::new(crate::services::analytics::TurnoverService::new(db)),
        }
    }
}
