//! Payment method breakdown.

use std::collections::BTreeMap;

use sea_orm::TransactionTrait;
use serde::Serialize;

use crate::{
    ops::snapshot::LedgerSnapshot, ops::with_tx, DateWindow, Engine, MoneyCents, Payment,
    PaymentMethod, ReportFilter, ResultEngine,
};

use super::{ratio_pct, round2};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PaymentMethodRow {
    pub method: PaymentMethod,
    pub amount: MoneyCents,
    pub count: u64,
    /// Share of the grand total, in percent.
    pub share_pct: f64,
    pub average_amount: MoneyCents,
}

pub(crate) fn compute(payments: &[Payment]) -> Vec<PaymentMethodRow> {
    let grand_total: MoneyCents = payments.iter().map(|p| p.amount).sum();

    let mut by_method: BTreeMap<PaymentMethod, (MoneyCents, u64)> = BTreeMap::new();
    for payment in payments {
        let entry = by_method
            .entry(payment.method)
            .or_insert((MoneyCents::ZERO, 0));
        entry.0 += payment.amount;
        entry.1 += 1;
    }

    let mut rows: Vec<PaymentMethodRow> = by_method
        .into_iter()
        .map(|(method, (amount, count))| PaymentMethodRow {
            method,
            amount,
            count,
            share_pct: round2(ratio_pct(amount.to_major(), grand_total.to_major())),
            average_amount: amount.divide_by(count),
        })
        .collect();

    rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    rows
}

impl Engine {
    /// Takings per payment method over the window, largest first.
    pub async fn payment_method_breakdown(
        &self,
        window: &DateWindow,
        filter: &ReportFilter,
    ) -> ResultEngine<Vec<PaymentMethodRow>> {
        with_tx!(self, |db_tx| {
            let snapshot: LedgerSnapshot = self.load_snapshot(&db_tx, filter, Some(window)).await?;
            Ok(compute(&snapshot.payments))
        })
    }
}
