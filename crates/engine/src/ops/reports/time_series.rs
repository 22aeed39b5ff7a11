//! Revenue/profit/volume time series with calendar bucketing.

use chrono::{Datelike, Days, NaiveDate};
use sea_orm::TransactionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    ops::snapshot::LedgerSnapshot, ops::with_tx, DateWindow, Engine, EngineError, MoneyCents,
    ReportFilter, ResultEngine,
};

use super::round2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Calendar truncation: the first day of the bucket containing `date`.
    /// Weeks start on Monday.
    fn truncate(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => {
                let back = date.weekday().num_days_from_monday() as u64;
                date.checked_sub_days(Days::new(back)).unwrap_or(date)
            }
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date),
        }
    }

    /// The first day of the bucket after `bucket_start`.
    fn next(self, bucket_start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => bucket_start.checked_add_days(Days::new(1)),
            Self::Week => bucket_start.checked_add_days(Days::new(7)),
            Self::Month => {
                let (year, month) = if bucket_start.month() == 12 {
                    (bucket_start.year() + 1, 1)
                } else {
                    (bucket_start.year(), bucket_start.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
            }
        }
    }
}

impl TryFrom<&str> for Granularity {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid granularity: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMetric {
    Revenue,
    Profit,
    ItemsSold,
    Payments,
}

impl TryFrom<&str> for SeriesMetric {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "revenue" => Ok(Self::Revenue),
            "profit" => Ok(Self::Profit),
            "items_sold" => Ok(Self::ItemsSold),
            "payments" => Ok(Self::Payments),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid series metric: {other}"
            ))),
        }
    }
}

/// One point of the requested metric. Money metrics are reported in major
/// units, rounded at this boundary; counts are whole numbers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub period_start: NaiveDate,
    pub value: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SeriesBucket {
    pub period_start: NaiveDate,
    pub revenue: MoneyCents,
    pub profit: MoneyCents,
    pub items_sold: u64,
    pub payments: u64,
}

/// Computes every bucket of the window's full partition, empty buckets
/// included.
///
/// Profit per bucket = bucket revenue − (cost + window expenses) of each
/// distinct item paid in the bucket. An item paid in several buckets is
/// charged in each of them; the charge is not amortized across buckets.
pub(crate) fn compute(
    snapshot: &LedgerSnapshot,
    window: &DateWindow,
    granularity: Granularity,
) -> Vec<SeriesBucket> {
    let item_by_id = snapshot.item_by_id();
    let expenses_by_item = snapshot.expenses_by_item();

    let mut buckets: Vec<SeriesBucket> = Vec::new();
    let mut cursor = granularity.truncate(window.start());
    loop {
        buckets.push(SeriesBucket {
            period_start: cursor,
            ..SeriesBucket::default()
        });
        match granularity.next(cursor) {
            Some(next) if next <= window.end() => cursor = next,
            _ => break,
        }
    }

    for bucket in &mut buckets {
        let period_start = bucket.period_start;
        let bucket_end = granularity.next(period_start);
        let in_bucket =
            |date: NaiveDate| date >= period_start && bucket_end.map(|end| date < end).unwrap_or(true);

        let mut paid_items: Vec<Uuid> = Vec::new();
        for payment in &snapshot.payments {
            if !in_bucket(payment.paid_on()) {
                continue;
            }
            bucket.revenue += payment.amount;
            bucket.payments += 1;
            if !paid_items.contains(&payment.item_id) {
                paid_items.push(payment.item_id);
            }
        }

        bucket.items_sold = paid_items.len() as u64;
        bucket.profit = bucket.revenue;
        for item_id in &paid_items {
            if let Some(item) = item_by_id.get(item_id) {
                bucket.profit -= item.cost.upper();
            }
            bucket.profit -= expenses_by_item
                .get(item_id)
                .copied()
                .unwrap_or(MoneyCents::ZERO);
        }
    }

    buckets
}

fn metric_value(bucket: &SeriesBucket, metric: SeriesMetric) -> f64 {
    match metric {
        SeriesMetric::Revenue => round2(bucket.revenue.to_major()),
        SeriesMetric::Profit => round2(bucket.profit.to_major()),
        SeriesMetric::ItemsSold => bucket.items_sold as f64,
        SeriesMetric::Payments => bucket.payments as f64,
    }
}

impl Engine {
    /// The requested metric bucketed over the window's full partition.
    pub async fn time_series(
        &self,
        metric: SeriesMetric,
        granularity: Granularity,
        window: &DateWindow,
        filter: &ReportFilter,
    ) -> ResultEngine<Vec<TimeSeriesPoint>> {
        with_tx!(self, |db_tx| {
            let snapshot = self.load_snapshot(&db_tx, filter, Some(window)).await?;
            Ok(compute(&snapshot, window, granularity)
                .iter()
                .map(|bucket| TimeSeriesPoint {
                    period_start: bucket.period_start,
                    value: metric_value(bucket, metric),
                })
                .collect())
        })
    }
}
