//! Shared integration-test harness: in-memory SQLite, embedded migrations,
//! and the full service container wired the way main() wires it.

use chrono::NaiveDate;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use vetstock_api::auth::{consts as perm, OrgContext};
use vetstock_api::db;
use vetstock_api::entities::batch::{self, Entity as Batch};
use vetstock_api::events::{process_events, EventSender};
use vetstock_api::handlers::AppServices;
use vetstock_api::services::batches::AddBatchInput;
use vetstock_api::services::items::CreateItemInput;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub ctx: OrgContext,
}

pub async fn setup() -> TestApp {
    // One pooled connection so every query shares the same in-memory
    // database.
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1);
    let conn = Database::connect(options).await.expect("sqlite connect");
    db::run_migrations(&conn).await.expect("migrations");
    let db = Arc::new(conn);

    let (tx, rx) = mpsc::channel(256);
    tokio::spawn(process_events(rx));

    let services = AppServices::new(db.clone(), EventSender::new(tx));
    let ctx = org_context();

    TestApp { db, services, ctx }
}

pub fn org_context() -> OrgContext {
    OrgContext::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        vec![
            perm::INVENTORY_VIEW.to_string(),
            perm::INVENTORY_EDIT.to_string(),
        ],
    )
}

impl TestApp {
    pub async fn create_item(&self, name: &str, reorder_threshold: i32) -> Uuid {
        self.services
            .items
            .create_item(
                &self.ctx,
                CreateItemInput {
                    name: name.to_string(),
                    category: Some("pharmacy".to_string()),
                    unit_of_measure: "vial".to_string(),
                    reorder_threshold,
                },
            )
            .await
            .expect("create item")
            .id
    }

    pub async fn add_batch(
        &self,
        item_id: Uuid,
        batch_number: &str,
        expiry: Option<NaiveDate>,
        quantity: i32,
    ) -> Uuid {
        self.services
            .batches
            .add_batch(
                &self.ctx,
                item_id,
                AddBatchInput {
                    batch_number: batch_number.to_string(),
                    expiry_date: expiry,
                    quantity_received: quantity,
                    unit_cost: None,
                },
            )
            .await
            .expect("add batch")
            .id
    }

    pub async fn batch(&self, batch_id: Uuid) -> batch::Model {
        Batch::find_by_id(batch_id)
            .one(self.db.as_ref())
            .await
            .expect("query batch")
            .expect("batch exists")
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
