use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of journaled stock movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementType {
    Receive,
    Consume,
    Adjust,
    Allocate,
    Release,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receive => "receive",
            MovementType::Consume => "consume",
            MovementType::Adjust => "adjust",
            MovementType::Allocate => "allocate",
            MovementType::Release => "release",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "receive" => Some(MovementType::Receive),
            "consume" => Some(MovementType::Consume),
            "adjust" => Some(MovementType::Adjust),
            "allocate" => Some(MovementType::Allocate),
            "release" => Some(MovementType::Release),
            _ => None,
        }
    }
}

/// Append-only journal of quantity and availability changes.
///
/// `delta` is the signed availability impact (receive/release positive,
/// consume/allocate negative, adjust either); `resulting_remaining` is the
/// batch's remaining quantity after the operation (unchanged by
/// allocate/release). Rows are never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub item_id: Uuid,
    pub batch_id: Uuid,
    pub movement_type: String,
    pub delta: i32,
    pub resulting_remaining: i32,
    pub actor_id: Uuid,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_type_round_trip() {
        assert_eq!(MovementType::Receive.as_str(), "receive");
        assert_eq!(MovementType::from_str("consume"), Some(MovementType::Consume));
        assert_eq!(MovementType::from_str("allocate"), Some(MovementType::Allocate));
        assert_eq!(MovementType::from_str("ship"), None);
    }
}
