//! At-a-glance dashboard snapshot.
//!
//! Stateless: every call recomputes from the current ledger, no cache sits
//! in between.

use std::collections::HashSet;

use sea_orm::{ConnectionTrait, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    expenses, ops::snapshot::LedgerSnapshot, payout_formula, payouts, CentsRange, ItemStatus,
    MoneyCents, ReportFilter, ResultEngine,
};

use super::{with_tx, Engine};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// All-time collected payments.
    pub total_revenue: MoneyCents,
    /// Items currently on the shop floor (status in-store).
    pub active_items: u64,
    /// Cost range summed over sold items not yet paid out.
    pub pending_payouts: CentsRange,
    /// Revenue − expenses − pending payouts; the payout bounds invert, so
    /// the worst case (max payout) is the low end.
    pub net_profit: CentsRange,
    /// Collected on sold items.
    pub incoming_payments: MoneyCents,
    /// Canonical payout formula summed over sold, unpaid-out items with at
    /// least one payment.
    pub upcoming_payouts: MoneyCents,
    /// Cost range over in-store items.
    pub in_store_cost: CentsRange,
    /// Listed price range over in-store items.
    pub in_store_value: CentsRange,
}

pub(crate) fn compute(
    snapshot: &LedgerSnapshot,
    paid_out_items: &HashSet<Uuid>,
    total_expenses: MoneyCents,
) -> DashboardSummary {
    let payments_by_item = snapshot.payments_by_item();
    let total_revenue = snapshot.revenue();

    let mut active_items = 0u64;
    let mut pending_payouts = CentsRange::ZERO;
    let mut incoming_payments = MoneyCents::ZERO;
    let mut upcoming_payouts = MoneyCents::ZERO;
    let mut in_store_cost = CentsRange::ZERO;
    let mut in_store_value = CentsRange::ZERO;

    for item in &snapshot.items {
        let collected: MoneyCents = payments_by_item
            .get(&item.id)
            .map(|payments| payments.iter().map(|p| p.amount).sum())
            .unwrap_or(MoneyCents::ZERO);

        match item.status {
            ItemStatus::InStore => {
                active_items += 1;
                in_store_cost += item.cost;
                in_store_value += item.price;
            }
            ItemStatus::Sold => {
                incoming_payments += collected;
                if !paid_out_items.contains(&item.id) {
                    pending_payouts += item.cost;
                    if collected.is_positive() {
                        upcoming_payouts +=
                            payout_formula::payout_amount(item.cost, item.price, collected);
                    }
                }
            }
            ItemStatus::Reserved | ItemStatus::Returned => {}
        }
    }

    let base = total_revenue - total_expenses;
    let net_profit = CentsRange::from_cents(
        (base - pending_payouts.upper()).cents(),
        (base - pending_payouts.lower()).cents(),
    );

    DashboardSummary {
        total_revenue,
        active_items,
        pending_payouts,
        net_profit,
        incoming_payments,
        upcoming_payouts,
        in_store_cost,
        in_store_value,
    }
}

impl Engine {
    /// The point-in-time business snapshot.
    pub async fn dashboard_summary(&self) -> ResultEngine<DashboardSummary> {
        with_tx!(self, |db_tx| {
            let snapshot = self
                .load_snapshot(&db_tx, &ReportFilter::default(), None)
                .await?;
            let paid_out_items = self.paid_out_item_ids(&db_tx).await?;
            let total_expenses = self.total_expenses(&db_tx).await?;
            Ok(compute(&snapshot, &paid_out_items, total_expenses))
        })
    }

    async fn paid_out_item_ids<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<HashSet<Uuid>> {
        Ok(payouts::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .filter_map(|model| Uuid::parse_str(&model.item_id).ok())
            .collect())
    }

    /// Every expense, general business ones included.
    async fn total_expenses<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<MoneyCents> {
        Ok(expenses::Entity::find()
            .all(db)
            .await?
            .iter()
            .map(|model| MoneyCents::new(model.amount_minor))
            .sum())
    }
}
