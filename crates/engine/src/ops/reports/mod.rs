//! Report shapes over the shared ledger snapshot.
//!
//! Each submodule is a pure transform (`compute`) plus a thin `Engine`
//! method that loads the snapshot in a read transaction. Shared rules:
//! every division is guarded (zero denominator yields 0, never NaN),
//! percentages are rounded to 2 decimals at the output boundary only, and
//! empty matches produce zeroed structures, not errors.

mod grouped;
mod inventory;
mod kpi;
mod methods;
mod profitability;
mod time_series;

pub use grouped::{GroupBy, GroupMetric, GroupedMetricsRow};
pub use inventory::{AgingBuckets, CategoryBreakdownRow, InventoryHealthReport};
pub use kpi::KpiReport;
pub use methods::PaymentMethodRow;
pub use profitability::{ItemProfitRow, ItemProfitabilityPage};
pub use time_series::{Granularity, SeriesMetric, TimeSeriesPoint};

/// Rounds to 2 decimals; only ever applied to an outgoing value.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator * 100`, guarded: a zero denominator yields 0.
pub(crate) fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_pct_guards_zero_denominator() {
        assert_eq!(ratio_pct(10.0, 0.0), 0.0);
        assert_eq!(ratio_pct(1.0, 4.0), 25.0);
    }

    #[test]
    fn round2_rounds_half_away() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(33.333_33), 33.33);
    }
}
