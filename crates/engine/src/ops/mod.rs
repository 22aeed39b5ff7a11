use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod dashboard;
mod health;
mod installments;
mod payments;
mod payouts;
mod reports;
mod snapshot;

pub use dashboard::DashboardSummary;
pub use health::{FinancialHealthReport, HealthFactors, HealthWeights, HEALTH_WEIGHTS};
pub use reports::{
    AgingBuckets, CategoryBreakdownRow, Granularity, GroupBy, GroupMetric, GroupedMetricsRow,
    InventoryHealthReport, ItemProfitRow, ItemProfitabilityPage, KpiReport, PaymentMethodRow,
    SeriesMetric, TimeSeriesPoint,
};
pub use snapshot::{DateWindow, ReportFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The analytics and ledger-write engine.
///
/// Stateless across calls: every report is a pure function of its inputs and
/// the ledger as of the enclosing read transaction, so concurrent reports
/// are independent. The only coordination point is the payment/payout write
/// path, which runs each mutation plus its derived-status update as one
/// transaction.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
