//! Installment plan primitives.
//!
//! A plan tracks one agreed installment towards an item. "Overdue" is never
//! stored; it is computed at query time from the due date and the pending
//! status.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
}

impl InstallmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for InstallmentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid installment status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InstallmentPlan {
    pub id: Uuid,
    pub item_id: Uuid,
    pub client_id: Uuid,
    pub amount: MoneyCents,
    pub due_on: NaiveDate,
    pub paid_amount: MoneyCents,
    pub status: InstallmentStatus,
}

impl InstallmentPlan {
    /// Computed, never stored: pending and past its due date.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InstallmentStatus::Pending && self.due_on < today
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "installment_plans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub item_id: String,
    pub client_id: String,
    pub amount_minor: i64,
    pub due_on: Date,
    pub paid_amount_minor: i64,
    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for InstallmentPlan {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("installment plan not exists".to_string()))?,
            item_id: Uuid::parse_str(&model.item_id)
                .map_err(|_| EngineError::KeyNotFound("item not exists".to_string()))?,
            client_id: Uuid::parse_str(&model.client_id)
                .map_err(|_| EngineError::KeyNotFound("client not exists".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
            due_on: model.due_on,
            paid_amount: MoneyCents::new(model.paid_amount_minor),
            status: InstallmentStatus::try_from(model.status.as_str())?,
        })
    }
}
