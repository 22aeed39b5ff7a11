//! Vendor payout primitives.
//!
//! At most one payout exists per item: the schema carries a unique index on
//! `item_id` and creation additionally requires the item to be `sold` and
//! not yet paid out, inside the same transaction.

use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Payout {
    pub id: Uuid,
    pub item_id: Uuid,
    pub vendor_id: Uuid,
    pub amount: MoneyCents,
    pub paid_at: DateTime<Utc>,
    pub bank_reference: Option<String>,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payouts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub item_id: String,
    pub vendor_id: String,
    pub amount_minor: i64,
    pub paid_at: DateTimeUtc,
    pub bank_reference: Option<String>,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payout> for ActiveModel {
    fn from(payout: &Payout) -> Self {
        Self {
            id: ActiveValue::Set(payout.id.to_string()),
            item_id: ActiveValue::Set(payout.item_id.to_string()),
            vendor_id: ActiveValue::Set(payout.vendor_id.to_string()),
            amount_minor: ActiveValue::Set(payout.amount.cents()),
            paid_at: ActiveValue::Set(payout.paid_at),
            bank_reference: ActiveValue::Set(payout.bank_reference.clone()),
            note: ActiveValue::Set(payout.note.clone()),
        }
    }
}

impl TryFrom<Model> for Payout {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("payout not exists".to_string()))?,
            item_id: Uuid::parse_str(&model.item_id)
                .map_err(|_| EngineError::KeyNotFound("item not exists".to_string()))?,
            vendor_id: Uuid::parse_str(&model.vendor_id)
                .map_err(|_| EngineError::KeyNotFound("vendor not exists".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
            paid_at: model.paid_at,
            bank_reference: model.bank_reference,
            note: model.note,
        })
    }
}
