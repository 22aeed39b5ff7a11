//! Financial analytics and payout engine for the Bottega consignment shop.
//!
//! The engine owns the ledger-derived side of the business: recording
//! payments (and the item status they imply), computing vendor payouts, and
//! turning the raw ledger into dashboards, KPI reports, time series,
//! dimensional groupings and a composite financial-health score.
//!
//! Entity CRUD, authentication and transport live in external services; this
//! crate only reads their records and mutates the ledger tables it owns.

pub use error::EngineError;
pub use expenses::Expense;
pub use installment_plans::{InstallmentPlan, InstallmentStatus};
pub use items::{Item, ItemStatus};
pub use money::MoneyCents;
pub use ops::{
    AgingBuckets, CategoryBreakdownRow, DashboardSummary, DateWindow, Engine, EngineBuilder,
    FinancialHealthReport, Granularity, GroupBy, GroupMetric, GroupedMetricsRow, HealthFactors,
    HealthWeights, InventoryHealthReport, ItemProfitRow, ItemProfitabilityPage, KpiReport,
    PaymentMethodRow, ReportFilter, SeriesMetric, TimeSeriesPoint, HEALTH_WEIGHTS,
};
pub use payments::{Payment, PaymentMethod};
pub use payout_formula::{adjustment_factor, payout_amount, SHORTFALL_RATE_PER_UNIT};
pub use payouts::Payout;
pub use range::CentsRange;

mod brands;
mod categories;
mod clients;
mod error;
mod expenses;
mod installment_plans;
mod items;
mod money;
mod ops;
mod payments;
mod payout_formula;
mod payouts;
mod range;
mod vendors;

type ResultEngine<T> = Result<T, EngineError>;
