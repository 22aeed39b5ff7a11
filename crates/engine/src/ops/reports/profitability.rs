//! Per-item profitability ranking.

use chrono::NaiveDate;
use sea_orm::TransactionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ops::snapshot::LedgerSnapshot, ops::with_tx, DateWindow, Engine, MoneyCents, ReportFilter,
    ResultEngine,
};

use super::{ratio_pct, round2};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemProfitRow {
    pub item_id: Uuid,
    /// The item's payments inside the window.
    pub revenue: MoneyCents,
    /// Preferred (max) cost plus the item's in-window expenses.
    pub cost: MoneyCents,
    pub profit: MoneyCents,
    pub margin_pct: f64,
    /// First in-window payment date.
    pub sold_on: Option<NaiveDate>,
    pub days_to_sell: Option<i64>,
}

/// A page of the revenue-descending ranking, with the total row count so
/// callers can derive "has more".
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ItemProfitabilityPage {
    pub rows: Vec<ItemProfitRow>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Ranks every item with at least one in-window payment.
///
/// Ordering is revenue descending with the item id as tie-break, so pages
/// `[0, limit)`, `[limit, 2·limit)`, … concatenate to the full ranking with
/// no duplicates or gaps.
pub(crate) fn compute(
    snapshot: &LedgerSnapshot,
    limit: u64,
    offset: u64,
) -> ItemProfitabilityPage {
    let item_by_id = snapshot.item_by_id();
    let payments_by_item = snapshot.payments_by_item();
    let expenses_by_item = snapshot.expenses_by_item();

    let mut rows: Vec<ItemProfitRow> = payments_by_item
        .iter()
        .map(|(item_id, payments)| {
            let revenue: MoneyCents = payments.iter().map(|p| p.amount).sum();
            let sold_on = payments.iter().map(|p| p.paid_on()).min();

            let (base_cost, days_to_sell) = match item_by_id.get(item_id) {
                Some(item) => (
                    item.cost.upper(),
                    sold_on.map(|on| (on - item.acquired_on).num_days()),
                ),
                None => (MoneyCents::ZERO, None),
            };
            let cost = base_cost
                + expenses_by_item
                    .get(item_id)
                    .copied()
                    .unwrap_or(MoneyCents::ZERO);
            let profit = revenue - cost;

            ItemProfitRow {
                item_id: *item_id,
                revenue,
                cost,
                profit,
                margin_pct: round2(ratio_pct(profit.to_major(), revenue.to_major())),
                sold_on,
                days_to_sell,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });

    let total = rows.len() as u64;
    let rows = rows
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    ItemProfitabilityPage {
        rows,
        total,
        limit,
        offset,
    }
}

impl Engine {
    /// One page of the per-item profitability ranking.
    pub async fn item_profitability(
        &self,
        window: &DateWindow,
        filter: &ReportFilter,
        limit: u64,
        offset: u64,
    ) -> ResultEngine<ItemProfitabilityPage> {
        with_tx!(self, |db_tx| {
            let snapshot = self.load_snapshot(&db_tx, filter, Some(window)).await?;
            Ok(compute(&snapshot, limit, offset))
        })
    }
}
