//! Payout write path.
//!
//! Creation is guarded structurally instead of by a best-effort existence
//! query: the item must be `sold`, must not already have a payout (checked
//! inside the transaction, backed by the unique index on
//! `payouts.item_id`), and must have collected at least one payment. The
//! amount always comes from the canonical price-adjusted formula.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    payout_formula, payouts, CentsRange, EngineError, ItemStatus, Payout, ResultEngine,
};

use super::{with_tx, Engine};

impl Engine {
    /// Pays a vendor out for a sold item.
    pub async fn create_payout(
        &self,
        item_id: Uuid,
        paid_at: DateTime<Utc>,
        bank_reference: Option<&str>,
        note: Option<&str>,
    ) -> ResultEngine<Payout> {
        with_tx!(self, |db_tx| {
            let item_model = self.require_item(&db_tx, item_id).await?;

            let status = ItemStatus::try_from(item_model.status.as_str())?;
            if status != ItemStatus::Sold {
                return Err(EngineError::PayoutNotAllowed(format!(
                    "item is {}, not sold",
                    status.as_str()
                )));
            }

            let existing = payouts::Entity::find()
                .filter(payouts::Column::ItemId.eq(item_model.id.clone()))
                .one(&db_tx)
                .await?;
            if existing.is_some() {
                return Err(EngineError::PayoutNotAllowed(
                    "item already paid out".to_string(),
                ));
            }

            let collected = self.collected_for_item(&db_tx, item_model.id.as_str()).await?;
            if !collected.is_positive() {
                return Err(EngineError::PayoutNotAllowed(
                    "no collected payments".to_string(),
                ));
            }

            let cost = CentsRange::new(item_model.min_cost_minor, item_model.max_cost_minor);
            let price = CentsRange::new(item_model.min_price_minor, item_model.max_price_minor);
            let vendor_id = Uuid::parse_str(&item_model.vendor_id)
                .map_err(|_| EngineError::KeyNotFound("vendor not exists".to_string()))?;

            let payout = Payout {
                id: Uuid::new_v4(),
                item_id,
                vendor_id,
                amount: payout_formula::payout_amount(cost, price, collected),
                paid_at,
                bank_reference: bank_reference.map(str::to_string),
                note: note.map(str::to_string),
            };
            payouts::ActiveModel::from(&payout).insert(&db_tx).await?;
            Ok(payout)
        })
    }
}
