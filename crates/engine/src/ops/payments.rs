//! Payment write path.
//!
//! The item status is a materialized view over the item's payments. Every
//! mutation here runs as one transaction: write the ledger row, recompute
//! the item's collected total, persist the re-derived status. No reader can
//! observe a payment without its status update.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    clients, items, payments, CentsRange, EngineError, Item, ItemStatus, MoneyCents, Payment,
    PaymentMethod, ResultEngine,
};

use super::{with_tx, Engine};

impl Engine {
    /// Returns an item with its current (derived) status.
    pub async fn item(&self, item_id: Uuid) -> ResultEngine<Item> {
        let model = self.require_item(&self.database, item_id).await?;
        Item::try_from(model)
    }

    /// Records a client payment against an item.
    ///
    /// Rejects non-positive amounts: refunds are not modelled, corrections
    /// go through [`Engine::correct_payment_amount`].
    pub async fn record_payment(
        &self,
        item_id: Uuid,
        client_id: Uuid,
        amount: MoneyCents,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let payment = Payment::new(item_id, client_id, amount, method, paid_at)?;

        with_tx!(self, |db_tx| {
            let item_model = self.require_item(&db_tx, item_id).await?;
            if clients::Entity::find_by_id(client_id.to_string())
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("client not exists".to_string()));
            }

            payments::ActiveModel::from(&payment).insert(&db_tx).await?;
            self.refresh_item_status(&db_tx, &item_model).await?;
            Ok(payment.id)
        })
    }

    /// Corrects a recorded payment's amount.
    pub async fn correct_payment_amount(
        &self,
        payment_id: Uuid,
        new_amount: MoneyCents,
    ) -> ResultEngine<()> {
        if !new_amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "payment amount must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let payment_model = self.require_payment(&db_tx, payment_id).await?;
            let item_model = self
                .require_item_raw(&db_tx, payment_model.item_id.as_str())
                .await?;

            let active = payments::ActiveModel {
                id: ActiveValue::Set(payment_model.id.clone()),
                amount_minor: ActiveValue::Set(new_amount.cents()),
                ..Default::default()
            };
            active.update(&db_tx).await?;

            self.refresh_item_status(&db_tx, &item_model).await?;
            Ok(())
        })
    }

    /// Deletes a payment and re-derives the item status from what remains.
    pub async fn delete_payment(&self, payment_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let payment_model = self.require_payment(&db_tx, payment_id).await?;
            let item_model = self
                .require_item_raw(&db_tx, payment_model.item_id.as_str())
                .await?;

            payments::Entity::delete_by_id(payment_model.id.clone())
                .exec(&db_tx)
                .await?;

            self.refresh_item_status(&db_tx, &item_model).await?;
            Ok(())
        })
    }

    pub(crate) async fn require_item<C: ConnectionTrait>(
        &self,
        db: &C,
        item_id: Uuid,
    ) -> ResultEngine<items::Model> {
        self.require_item_raw(db, item_id.to_string().as_str()).await
    }

    async fn require_item_raw<C: ConnectionTrait>(
        &self,
        db: &C,
        item_id: &str,
    ) -> ResultEngine<items::Model> {
        items::Entity::find_by_id(item_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("item not exists".to_string()))
    }

    async fn require_payment<C: ConnectionTrait>(
        &self,
        db: &C,
        payment_id: Uuid,
    ) -> ResultEngine<payments::Model> {
        payments::Entity::find_by_id(payment_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("payment not exists".to_string()))
    }

    /// Sums the item's payments and persists the re-derived status.
    ///
    /// Idempotent: replaying it against an unchanged ledger writes the same
    /// status again.
    pub(crate) async fn refresh_item_status<C: ConnectionTrait>(
        &self,
        db: &C,
        item_model: &items::Model,
    ) -> ResultEngine<ItemStatus> {
        let collected = self.collected_for_item(db, item_model.id.as_str()).await?;
        let price = CentsRange::new(item_model.min_price_minor, item_model.max_price_minor);
        let status = ItemStatus::from_collected(price.upper(), collected);

        items::status_update(item_model.id.as_str(), status)
            .update(db)
            .await?;
        Ok(status)
    }

    pub(crate) async fn collected_for_item<C: ConnectionTrait>(
        &self,
        db: &C,
        item_id: &str,
    ) -> ResultEngine<MoneyCents> {
        let rows = payments::Entity::find()
            .filter(payments::Column::ItemId.eq(item_id.to_string()))
            .all(db)
            .await?;
        Ok(rows
            .iter()
            .map(|row| MoneyCents::new(row.amount_minor))
            .sum())
    }
}
