//! Metrics grouped by a business dimension.

use std::collections::HashMap;

use sea_orm::{ConnectionTrait, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    brands, categories, clients, ops::snapshot::LedgerSnapshot, ops::with_tx, vendors, DateWindow,
    Engine, EngineError, MoneyCents, ReportFilter, ResultEngine,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Vendor,
    Client,
    Brand,
    Category,
}

impl GroupBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Client => "client",
            Self::Brand => "brand",
            Self::Category => "category",
        }
    }

    fn unknown_label(self) -> &'static str {
        match self {
            Self::Vendor => "Unknown Vendor",
            Self::Client => "Unknown Client",
            Self::Brand => "Unknown Brand",
            Self::Category => "Unknown Category",
        }
    }
}

impl TryFrom<&str> for GroupBy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "vendor" => Ok(Self::Vendor),
            "client" => Ok(Self::Client),
            "brand" => Ok(Self::Brand),
            "category" => Ok(Self::Category),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid group dimension: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMetric {
    Revenue,
    Profit,
    ItemsSold,
    AvgOrderValue,
}

impl TryFrom<&str> for GroupMetric {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "revenue" => Ok(Self::Revenue),
            "profit" => Ok(Self::Profit),
            "items_sold" => Ok(Self::ItemsSold),
            "avg_order_value" => Ok(Self::AvgOrderValue),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid group metric: {other}"
            ))),
        }
    }
}

/// One group row. Only the requested metrics are populated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupedMetricsRow {
    /// Dimension id; `None` when the item has no value for the dimension.
    pub key: Option<Uuid>,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<MoneyCents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<MoneyCents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_sold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_order_value: Option<MoneyCents>,
}

#[derive(Default)]
struct GroupAcc {
    revenue: MoneyCents,
    payments: u64,
    item_ids: Vec<Uuid>,
}

pub(crate) fn compute(
    snapshot: &LedgerSnapshot,
    group_by: GroupBy,
    metrics: &[GroupMetric],
    names: &HashMap<Uuid, String>,
) -> Vec<GroupedMetricsRow> {
    let item_by_id = snapshot.item_by_id();
    let expenses_by_item = snapshot.expenses_by_item();

    let mut groups: HashMap<Option<Uuid>, GroupAcc> = HashMap::new();
    for payment in &snapshot.payments {
        let Some(item) = item_by_id.get(&payment.item_id) else {
            continue;
        };
        let key = match group_by {
            GroupBy::Vendor => Some(item.vendor_id),
            GroupBy::Client => Some(payment.client_id),
            GroupBy::Brand => item.brand_id,
            GroupBy::Category => item.category_id,
        };

        let acc = groups.entry(key).or_default();
        acc.revenue += payment.amount;
        acc.payments += 1;
        if !acc.item_ids.contains(&payment.item_id) {
            acc.item_ids.push(payment.item_id);
        }
    }

    let mut rows: Vec<GroupedMetricsRow> = groups
        .into_iter()
        .map(|(key, acc)| {
            // Same cost-once rule as the KPI report, restricted to the
            // group's items; expenses follow the item.
            let mut profit = acc.revenue;
            for item_id in &acc.item_ids {
                if let Some(item) = item_by_id.get(item_id) {
                    profit -= item.cost.upper();
                }
                profit -= expenses_by_item
                    .get(item_id)
                    .copied()
                    .unwrap_or(MoneyCents::ZERO);
            }

            let label = match key {
                None => group_by.unknown_label().to_string(),
                Some(id) => names
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| id.to_string()),
            };

            // Revenue and item count are filled unconditionally so the sort
            // below can use them; unrequested ones are cleared afterwards.
            GroupedMetricsRow {
                key,
                label,
                revenue: Some(acc.revenue),
                profit: metrics.contains(&GroupMetric::Profit).then_some(profit),
                items_sold: Some(acc.item_ids.len() as u64),
                avg_order_value: metrics
                    .contains(&GroupMetric::AvgOrderValue)
                    .then_some(acc.revenue.divide_by(acc.payments)),
            }
        })
        .collect();

    // Revenue rules the ordering; raw item count when revenue was not asked
    // for. Label breaks ties so pagination-free output stays stable.
    let by_revenue = metrics.contains(&GroupMetric::Revenue);
    rows.sort_by(|a, b| {
        let primary = if by_revenue {
            b.revenue.cmp(&a.revenue)
        } else {
            b.items_sold.cmp(&a.items_sold)
        };
        primary.then_with(|| a.label.cmp(&b.label))
    });

    if !by_revenue {
        for row in &mut rows {
            row.revenue = None;
        }
    }
    if !metrics.contains(&GroupMetric::ItemsSold) {
        for row in &mut rows {
            row.items_sold = None;
        }
    }

    rows
}

impl Engine {
    /// Caller-selected metrics grouped by one dimension, revenue-descending.
    pub async fn grouped_metrics(
        &self,
        group_by: GroupBy,
        metrics: &[GroupMetric],
        window: &DateWindow,
        filter: &ReportFilter,
    ) -> ResultEngine<Vec<GroupedMetricsRow>> {
        if metrics.is_empty() {
            return Err(EngineError::InvalidFilter(
                "metrics must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let snapshot = self.load_snapshot(&db_tx, filter, Some(window)).await?;
            let names = self.load_names(&db_tx, group_by).await?;
            Ok(compute(&snapshot, group_by, metrics, &names))
        })
    }

    pub(crate) async fn load_names<C: ConnectionTrait>(
        &self,
        db: &C,
        group_by: GroupBy,
    ) -> ResultEngine<HashMap<Uuid, String>> {
        let pairs: Vec<(String, String)> = match group_by {
            GroupBy::Vendor => vendors::Entity::find()
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect(),
            GroupBy::Client => clients::Entity::find()
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect(),
            GroupBy::Brand => brands::Entity::find()
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect(),
            GroupBy::Category => categories::Entity::find()
                .all(db)
                .await?
                .into_iter()
                .map(|m| (m.id, m.name))
                .collect(),
        };

        Ok(pairs
            .into_iter()
            .filter_map(|(id, name)| Uuid::parse_str(&id).ok().map(|id| (id, name)))
            .collect())
    }
}
