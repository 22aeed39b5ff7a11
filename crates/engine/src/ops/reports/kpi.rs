//! Period KPI report.

use std::collections::HashSet;

use sea_orm::TransactionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ops::snapshot::LedgerSnapshot, ops::with_tx, DateWindow, Engine, MoneyCents, ReportFilter,
    ResultEngine,
};

use super::{ratio_pct, round2};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KpiReport {
    /// Sum of payment amounts in the window.
    pub revenue: MoneyCents,
    /// Cost (max, falling back to min) of each distinct item that received
    /// at least one payment in the window, charged once per item.
    pub cogs: MoneyCents,
    pub gross_profit: MoneyCents,
    pub gross_margin_pct: f64,
    /// Item-attributed expenses incurred in the window on the paid items.
    pub total_expenses: MoneyCents,
    pub net_profit: MoneyCents,
    pub net_margin_pct: f64,
    /// Distinct items paid in the window.
    pub items_sold: u64,
    pub payment_count: u64,
    pub unique_clients: u64,
    pub average_order_value: MoneyCents,
    /// Mean of (first payment date − acquisition date), in days, over items
    /// where both dates exist.
    pub average_days_to_sell: f64,
    /// `revenue / (cogs / items_sold)` — an approximation, not the
    /// textbook ratio.
    pub inventory_turnover: f64,
}

pub(crate) fn compute(snapshot: &LedgerSnapshot) -> KpiReport {
    let item_by_id = snapshot.item_by_id();
    let payments_by_item = snapshot.payments_by_item();
    let expenses_by_item = snapshot.expenses_by_item();

    let revenue = snapshot.revenue();
    let payment_count = snapshot.payments.len() as u64;
    let unique_clients = snapshot
        .payments
        .iter()
        .map(|payment| payment.client_id)
        .collect::<HashSet<Uuid>>()
        .len() as u64;

    let paid_item_ids: Vec<Uuid> = {
        let mut ids: Vec<Uuid> = payments_by_item.keys().copied().collect();
        ids.sort_unstable();
        ids
    };
    let items_sold = paid_item_ids.len() as u64;

    let mut cogs = MoneyCents::ZERO;
    let mut total_expenses = MoneyCents::ZERO;
    let mut days_to_sell: Vec<i64> = Vec::new();
    for item_id in &paid_item_ids {
        let Some(item) = item_by_id.get(item_id) else {
            continue;
        };
        cogs += item.cost.upper();
        total_expenses += expenses_by_item
            .get(item_id)
            .copied()
            .unwrap_or(MoneyCents::ZERO);

        if let Some(first_paid_on) = payments_by_item
            .get(item_id)
            .and_then(|payments| payments.iter().map(|p| p.paid_on()).min())
        {
            days_to_sell.push((first_paid_on - item.acquired_on).num_days());
        }
    }

    let gross_profit = revenue - cogs;
    let net_profit = gross_profit - total_expenses;

    let average_days_to_sell = if days_to_sell.is_empty() {
        0.0
    } else {
        days_to_sell.iter().sum::<i64>() as f64 / days_to_sell.len() as f64
    };

    // revenue / (cogs / items_sold), guarded at both levels.
    let cost_per_item = if items_sold == 0 {
        0.0
    } else {
        cogs.to_major() / items_sold as f64
    };
    let inventory_turnover = if cost_per_item == 0.0 {
        0.0
    } else {
        revenue.to_major() / cost_per_item
    };

    KpiReport {
        revenue,
        cogs,
        gross_profit,
        gross_margin_pct: round2(ratio_pct(gross_profit.to_major(), revenue.to_major())),
        total_expenses,
        net_profit,
        net_margin_pct: round2(ratio_pct(net_profit.to_major(), revenue.to_major())),
        items_sold,
        payment_count,
        unique_clients,
        average_order_value: revenue.divide_by(payment_count),
        average_days_to_sell: round2(average_days_to_sell),
        inventory_turnover: round2(inventory_turnover),
    }
}

impl Engine {
    /// Period KPIs over the filtered ledger.
    pub async fn kpi_report(
        &self,
        window: &DateWindow,
        filter: &ReportFilter,
    ) -> ResultEngine<KpiReport> {
        with_tx!(self, |db_tx| {
            let snapshot = self.load_snapshot(&db_tx, filter, Some(window)).await?;
            Ok(compute(&snapshot))
        })
    }
}
