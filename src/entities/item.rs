use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub unit_of_measure: String,
    pub reorder_threshold: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::batch::Entity")]
    StockBatches,
    #[sea_orm(has_many = "super::allocation::Entity")]
    StockAllocations,
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockBatches.def()
    }
}

impl Related<super::allocation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Item lifecycle status. ACTIVE and HIDDEN are interchangeable;
/// ARCHIVED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Active,
    Hidden,
    Archived,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "ACTIVE",
            ItemStatus::Hidden => "HIDDEN",
            ItemStatus::Archived => "ARCHIVED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ItemStatus::Active),
            "HIDDEN" => Some(ItemStatus::Hidden),
            "ARCHIVED" => Some(ItemStatus::Archived),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_status_round_trip() {
        assert_eq!(ItemStatus::Active.as_str(), "ACTIVE");
        assert_eq!(ItemStatus::from_str("HIDDEN"), Some(ItemStatus::Hidden));
        assert_eq!(ItemStatus::from_str("ARCHIVED"), Some(ItemStatus::Archived));
        assert_eq!(ItemStatus::from_str("archived"), None);
    }
}
