//! Consigned item primitives.
//!
//! An `Item` is the unit a vendor consigns: it carries a cost range (what
//! the vendor is owed at most/least), a listed price range and a lifecycle
//! status. The status is stored but **derived**: every ledger write touching
//! the item recomputes it from the item's payment total inside the same
//! transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{entity::prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CentsRange, EngineError, MoneyCents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Available on the shop floor, no payment received.
    InStore,
    /// Partially paid, held for the paying client.
    Reserved,
    /// Fully collected.
    Sold,
    /// Handed back to the consigning vendor.
    Returned,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStore => "in_store",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
            Self::Returned => "returned",
        }
    }

    /// Derives the lifecycle status implied by the item's collected total.
    ///
    /// The reference price is the item's upper sales price (max, falling
    /// back to min). A zero reference price means any positive payment
    /// covers it, so the item goes straight to `Sold`.
    ///
    /// Pure and idempotent: re-deriving from the same ledger state yields
    /// the same status.
    #[must_use]
    pub fn from_collected(reference_price: MoneyCents, collected: MoneyCents) -> Self {
        if !collected.is_positive() {
            Self::InStore
        } else if collected < reference_price {
            Self::Reserved
        } else {
            Self::Sold
        }
    }
}

impl TryFrom<&str> for ItemStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "in_store" => Ok(Self::InStore),
            "reserved" => Ok(Self::Reserved),
            "sold" => Ok(Self::Sold),
            "returned" => Ok(Self::Returned),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid item status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub cost: CentsRange,
    pub price: CentsRange,
    pub status: ItemStatus,
    pub acquired_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// The price a payment total is measured against: max sales price,
    /// falling back to min.
    #[must_use]
    pub fn reference_price(&self) -> MoneyCents {
        self.price.upper()
    }

    /// Whole days since the item was acquired.
    #[must_use]
    pub fn age_days(&self, today: NaiveDate) -> i64 {
        (today - self.acquired_on).num_days()
    }

    /// Still physically in the shop (unsold and not returned).
    #[must_use]
    pub fn in_inventory(&self) -> bool {
        matches!(self.status, ItemStatus::InStore | ItemStatus::Reserved)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub vendor_id: String,
    pub brand_id: Option<String>,
    pub category_id: Option<String>,
    pub min_cost_minor: Option<i64>,
    pub max_cost_minor: Option<i64>,
    pub min_price_minor: Option<i64>,
    pub max_price_minor: Option<i64>,
    pub status: String,
    pub acquired_on: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Item {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("item not exists".to_string()))?,
            vendor_id: Uuid::parse_str(&model.vendor_id)
                .map_err(|_| EngineError::KeyNotFound("vendor not exists".to_string()))?,
            brand_id: model.brand_id.and_then(|s| Uuid::parse_str(&s).ok()),
            category_id: model.category_id.and_then(|s| Uuid::parse_str(&s).ok()),
            cost: CentsRange::new(model.min_cost_minor, model.max_cost_minor),
            price: CentsRange::new(model.min_price_minor, model.max_price_minor),
            status: ItemStatus::try_from(model.status.as_str())?,
            acquired_on: model.acquired_on,
            created_at: model.created_at,
        })
    }
}

/// Persists a freshly derived status for an item.
pub(crate) fn status_update(item_id: &str, status: ItemStatus) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(item_id.to_string()),
        status: ActiveValue::Set(status.as_str().to_string()),
        ..Default::default()
    }
}
