use std::error::Error;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

use engine::{
    DateWindow, Engine, Granularity, GroupBy, GroupMetric, MoneyCents, PaymentMethod,
    ReportFilter, SeriesMetric,
};

#[derive(Parser, Debug)]
#[command(name = "bottega_admin")]
#[command(about = "Back-office console for Bottega (ledger writes and reports)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./bottega.db?mode=rwc"
    )]
    database_url: String,

    /// Log level for the CLI and the engine.
    #[arg(long, env = "BOTTEGA_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Payment(Payment),
    Payout(Payout),
    Installments(Installments),
    Report(Report),
}

#[derive(Args, Debug)]
struct Payment {
    #[command(subcommand)]
    command: PaymentCommand,
}

#[derive(Subcommand, Debug)]
enum PaymentCommand {
    /// Record a client payment against an item.
    Record(PaymentRecordArgs),
    /// Correct a recorded payment's amount.
    Correct(PaymentCorrectArgs),
    /// Delete a payment (the item status is re-derived).
    Delete(PaymentDeleteArgs),
}

#[derive(Args, Debug)]
struct PaymentRecordArgs {
    #[arg(long)]
    item: Uuid,
    #[arg(long)]
    client: Uuid,
    /// Amount in major units, e.g. `125.00`.
    #[arg(long)]
    amount: MoneyCents,
    /// One of: cash, card, bank_transfer, other.
    #[arg(long)]
    method: String,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    paid_at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct PaymentCorrectArgs {
    #[arg(long)]
    id: Uuid,
    #[arg(long)]
    amount: MoneyCents,
}

#[derive(Args, Debug)]
struct PaymentDeleteArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Payout {
    #[command(subcommand)]
    command: PayoutCommand,
}

#[derive(Subcommand, Debug)]
enum PayoutCommand {
    /// Pay a vendor out for a sold item.
    Create(PayoutCreateArgs),
}

#[derive(Args, Debug)]
struct PayoutCreateArgs {
    #[arg(long)]
    item: Uuid,
    #[arg(long)]
    bank_reference: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct Installments {
    #[command(subcommand)]
    command: InstallmentsCommand,
}

#[derive(Subcommand, Debug)]
enum InstallmentsCommand {
    /// List pending installment plans past their due date.
    Overdue,
}

#[derive(Args, Debug)]
struct Report {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Point-in-time business snapshot.
    Dashboard,
    /// Period KPIs.
    Kpi(WindowArgs),
    /// Bucketed time series for one metric.
    Series(SeriesArgs),
    /// Metrics grouped by a dimension.
    Groups(GroupsArgs),
    /// Per-item profitability ranking, paginated.
    Items(ItemsArgs),
    /// Inventory composition and aging.
    Inventory(FilterArgs),
    /// Takings per payment method.
    Methods(WindowArgs),
    /// Composite financial-health score.
    Health,
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// Start date, `YYYY-MM-DD` (inclusive).
    #[arg(long)]
    from: String,
    /// End date, `YYYY-MM-DD` (inclusive).
    #[arg(long)]
    to: String,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Args, Debug)]
struct SeriesArgs {
    /// One of: revenue, profit, items_sold, payments.
    #[arg(long)]
    metric: String,
    /// One of: day, week, month.
    #[arg(long, default_value = "month")]
    granularity: String,
    #[command(flatten)]
    window: WindowArgs,
}

#[derive(Args, Debug)]
struct GroupsArgs {
    /// One of: vendor, client, brand, category.
    #[arg(long)]
    by: String,
    /// Comma-separated subset of: revenue, profit, items_sold,
    /// avg_order_value.
    #[arg(long, value_delimiter = ',', default_value = "revenue")]
    metrics: Vec<String>,
    #[command(flatten)]
    window: WindowArgs,
}

#[derive(Args, Debug)]
struct ItemsArgs {
    #[arg(long, default_value_t = 50)]
    limit: u64,
    #[arg(long, default_value_t = 0)]
    offset: u64,
    #[command(flatten)]
    window: WindowArgs,
}

/// Dimension allow-lists; repeat a flag to allow several values.
#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long = "vendor")]
    vendors: Vec<String>,
    #[arg(long = "client")]
    clients: Vec<String>,
    #[arg(long = "brand")]
    brands: Vec<String>,
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Item status, one of: in_store, reserved, sold, returned.
    #[arg(long = "status")]
    statuses: Vec<String>,
}

impl FilterArgs {
    fn into_filter(self) -> Result<ReportFilter, engine::EngineError> {
        Ok(ReportFilter {
            vendor_ids: ReportFilter::parse_ids(&self.vendors)?,
            client_ids: ReportFilter::parse_ids(&self.clients)?,
            brand_ids: ReportFilter::parse_ids(&self.brands)?,
            category_ids: ReportFilter::parse_ids(&self.categories)?,
            statuses: ReportFilter::parse_statuses(&self.statuses)?,
        })
    }
}

impl WindowArgs {
    fn into_parts(self) -> Result<(DateWindow, ReportFilter), engine::EngineError> {
        let window = DateWindow::parse(&self.from, &self.to)?;
        let filter = self.filter.into_filter()?;
        Ok((window, filter))
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "bottega_admin={level},engine={level}",
            level = cli.log_level
        ))
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Payment(Payment {
            command: PaymentCommand::Record(args),
        }) => {
            let method = PaymentMethod::try_from(args.method.as_str())?;
            let paid_at = args.paid_at.unwrap_or_else(Utc::now);
            let payment_id = engine
                .record_payment(args.item, args.client, args.amount, method, paid_at)
                .await?;
            tracing::info!(%payment_id, "payment recorded");
            println!("recorded payment: {payment_id}");
        }
        Command::Payment(Payment {
            command: PaymentCommand::Correct(args),
        }) => {
            engine.correct_payment_amount(args.id, args.amount).await?;
            println!("corrected payment: {}", args.id);
        }
        Command::Payment(Payment {
            command: PaymentCommand::Delete(args),
        }) => {
            engine.delete_payment(args.id).await?;
            println!("deleted payment: {}", args.id);
        }
        Command::Payout(Payout {
            command: PayoutCommand::Create(args),
        }) => {
            let payout = engine
                .create_payout(
                    args.item,
                    Utc::now(),
                    args.bank_reference.as_deref(),
                    args.note.as_deref(),
                )
                .await?;
            tracing::info!(payout_id = %payout.id, amount = %payout.amount, "payout created");
            println!("created payout: {} ({})", payout.amount, payout.id);
        }
        Command::Installments(Installments {
            command: InstallmentsCommand::Overdue,
        }) => {
            let overdue = engine
                .list_overdue_installments(Utc::now().date_naive())
                .await?;
            print_json(&overdue)?;
        }
        Command::Report(Report { command }) => match command {
            ReportCommand::Dashboard => print_json(&engine.dashboard_summary().await?)?,
            ReportCommand::Kpi(args) => {
                let (window, filter) = args.into_parts()?;
                print_json(&engine.kpi_report(&window, &filter).await?)?;
            }
            ReportCommand::Series(args) => {
                let metric = SeriesMetric::try_from(args.metric.as_str())?;
                let granularity = Granularity::try_from(args.granularity.as_str())?;
                let (window, filter) = args.window.into_parts()?;
                print_json(
                    &engine
                        .time_series(metric, granularity, &window, &filter)
                        .await?,
                )?;
            }
            ReportCommand::Groups(args) => {
                let group_by = GroupBy::try_from(args.by.as_str())?;
                let metrics: Vec<GroupMetric> = args
                    .metrics
                    .iter()
                    .map(|raw| GroupMetric::try_from(raw.as_str()))
                    .collect::<Result<_, _>>()?;
                let (window, filter) = args.window.into_parts()?;
                print_json(
                    &engine
                        .grouped_metrics(group_by, &metrics, &window, &filter)
                        .await?,
                )?;
            }
            ReportCommand::Items(args) => {
                let (limit, offset) = (args.limit, args.offset);
                let (window, filter) = args.window.into_parts()?;
                print_json(
                    &engine
                        .item_profitability(&window, &filter, limit, offset)
                        .await?,
                )?;
            }
            ReportCommand::Inventory(filter) => {
                print_json(&engine.inventory_health(&filter.into_filter()?).await?)?;
            }
            ReportCommand::Methods(args) => {
                let (window, filter) = args.into_parts()?;
                print_json(&engine.payment_method_breakdown(&window, &filter).await?)?;
            }
            ReportCommand::Health => print_json(&engine.financial_health().await?)?,
        },
    }

    Ok(())
}
