//! Expense primitives.
//!
//! An expense with an `item_id` (cleaning, repair, authentication fees) is
//! charged against that item in profitability reports. A general expense
//! (`item_id` null) only enters whole-business figures.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    pub kind: String,
    pub amount: MoneyCents,
    pub incurred_on: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub item_id: Option<String>,
    pub kind: String,
    pub amount_minor: i64,
    pub incurred_on: Date,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            item_id: model.item_id.and_then(|s| Uuid::parse_str(&s).ok()),
            kind: model.kind,
            amount: MoneyCents::new(model.amount_minor),
            incurred_on: model.incurred_on,
        })
    }
}
