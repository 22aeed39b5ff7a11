//! Client payment primitives.
//!
//! A `Payment` is the atomic ledger event: a client hands over money for an
//! item. Payments are effectively immutable; the only sanctioned mutations
//! are explicit amount corrections and hard deletes, both of which re-derive
//! the item status in the same transaction.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{entity::prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Other => "other",
        }
    }

    /// Reads a stored method string, mapping anything unknown to `Other`.
    ///
    /// Reports must never abort on a single malformed row.
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        PaymentMethod::try_from(value).unwrap_or(Self::Other)
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub item_id: Uuid,
    pub client_id: Uuid,
    pub amount: MoneyCents,
    pub method: PaymentMethod,
    pub paid_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        item_id: Uuid,
        client_id: Uuid,
        amount: MoneyCents,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "payment amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            item_id,
            client_id,
            amount,
            method,
            paid_at,
        })
    }

    /// Calendar day the payment landed on, used for report bucketing.
    #[must_use]
    pub fn paid_on(&self) -> NaiveDate {
        self.paid_at.date_naive()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub item_id: String,
    pub client_id: String,
    pub amount_minor: i64,
    pub method: String,
    pub paid_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::items::Entity",
        from = "Column::ItemId",
        to = "super::items::Column::Id"
    )]
    Items,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Payment> for ActiveModel {
    fn from(payment: &Payment) -> Self {
        Self {
            id: ActiveValue::Set(payment.id.to_string()),
            item_id: ActiveValue::Set(payment.item_id.to_string()),
            client_id: ActiveValue::Set(payment.client_id.to_string()),
            amount_minor: ActiveValue::Set(payment.amount.cents()),
            method: ActiveValue::Set(payment.method.as_str().to_string()),
            paid_at: ActiveValue::Set(payment.paid_at),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("payment not exists".to_string()))?,
            item_id: Uuid::parse_str(&model.item_id)
                .map_err(|_| EngineError::KeyNotFound("item not exists".to_string()))?,
            client_id: Uuid::parse_str(&model.client_id)
                .map_err(|_| EngineError::KeyNotFound("client not exists".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
            method: PaymentMethod::from_stored(&model.method),
            paid_at: model.paid_at,
        })
    }
}
