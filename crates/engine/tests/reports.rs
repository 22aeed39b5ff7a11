use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, Value};
use uuid::Uuid;

use engine::{
    DateWindow, Engine, Granularity, GroupBy, GroupMetric, ItemStatus, MoneyCents, PaymentMethod,
    ReportFilter, SeriesMetric,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<Value>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Seed {
    vendor_rossi: Uuid,
    vendor_bianchi: Uuid,
    client_giulia: Uuid,
    bag_sold: Uuid,
    shoes_sold: Uuid,
    watch_sold: Uuid,
}

/// A small but complete consignment ledger:
///
/// - `bag_sold` (Rossi, Prada, Bags): 600 + 400 across Jan/Feb, sold for
///   the full listed 1000; a 20 cleaning expense.
/// - `shoes_sold` (Rossi, no brand, Shoes): 400 in Jan, sold.
/// - `watch_sold` (Bianchi, Prada, no category): 600 in Feb, sold; a 10
///   expense in March, outside the report window.
/// - `lamp_in_store` (Bianchi, Bags): never paid, still on the floor.
/// - A general 50 expense without an item.
/// - 5 installment plans, 4 paid, 1 pending past due.
async fn seed_ledger(engine: &Engine, db: &DatabaseConnection) -> Seed {
    let vendor_rossi = Uuid::new_v4();
    let vendor_bianchi = Uuid::new_v4();
    for (id, name) in [(vendor_rossi, "Atelier Rossi"), (vendor_bianchi, "Casa Bianchi")] {
        exec(
            db,
            "INSERT INTO vendors (id, name) VALUES (?, ?)",
            vec![id.to_string().into(), name.into()],
        )
        .await;
    }

    let client_giulia = Uuid::new_v4();
    let client_marco = Uuid::new_v4();
    let client_anna = Uuid::new_v4();
    for (id, name) in [
        (client_giulia, "Giulia"),
        (client_marco, "Marco"),
        (client_anna, "Anna"),
    ] {
        exec(
            db,
            "INSERT INTO clients (id, name) VALUES (?, ?)",
            vec![id.to_string().into(), name.into()],
        )
        .await;
    }

    let brand_prada = Uuid::new_v4();
    exec(
        db,
        "INSERT INTO brands (id, name) VALUES (?, ?)",
        vec![brand_prada.to_string().into(), "Prada".into()],
    )
    .await;

    let category_bags = Uuid::new_v4();
    let category_shoes = Uuid::new_v4();
    for (id, name) in [(category_bags, "Bags"), (category_shoes, "Shoes")] {
        exec(
            db,
            "INSERT INTO categories (id, name) VALUES (?, ?)",
            vec![id.to_string().into(), name.into()],
        )
        .await;
    }

    let bag_sold = Uuid::new_v4();
    let shoes_sold = Uuid::new_v4();
    let watch_sold = Uuid::new_v4();
    let lamp_in_store = Uuid::new_v4();
    let items: Vec<(Uuid, Uuid, Option<Uuid>, Option<Uuid>, Option<i64>, Option<i64>, Option<i64>, Option<i64>, &str)> = vec![
        (
            bag_sold,
            vendor_rossi,
            Some(brand_prada),
            Some(category_bags),
            Some(40_000),
            Some(50_000),
            Some(80_000),
            Some(100_000),
            "2026-01-05",
        ),
        (
            shoes_sold,
            vendor_rossi,
            None,
            Some(category_shoes),
            Some(10_000),
            Some(20_000),
            Some(30_000),
            Some(40_000),
            "2026-01-10",
        ),
        (
            watch_sold,
            vendor_bianchi,
            Some(brand_prada),
            None,
            None,
            Some(30_000),
            None,
            Some(60_000),
            "2025-12-01",
        ),
        (
            lamp_in_store,
            vendor_bianchi,
            None,
            Some(category_bags),
            Some(5_000),
            Some(8_000),
            Some(15_000),
            Some(20_000),
            "2025-06-01",
        ),
    ];
    for (id, vendor, brand, category, min_cost, max_cost, min_price, max_price, acquired) in items {
        exec(
            db,
            "INSERT INTO items (id, vendor_id, brand_id, category_id, min_cost_minor, \
             max_cost_minor, min_price_minor, max_price_minor, status, acquired_on, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            vec![
                id.to_string().into(),
                vendor.to_string().into(),
                brand.map(|b| b.to_string()).into(),
                category.map(|c| c.to_string()).into(),
                min_cost.into(),
                max_cost.into(),
                min_price.into(),
                max_price.into(),
                "in_store".into(),
                acquired.into(),
                format!("{acquired} 09:00:00").into(),
            ],
        )
        .await;
    }

    let pay = |item: Uuid, client: Uuid, amount: i64, method: PaymentMethod, on: NaiveDate| {
        let paid_at = on.and_time(NaiveTime::from_hms_opt(11, 0, 0).unwrap()).and_utc();
        async move {
            engine
                .record_payment(item, client, MoneyCents::new(amount), method, paid_at)
                .await
                .unwrap();
        }
    };
    pay(bag_sold, client_giulia, 60_000, PaymentMethod::Card, day(2026, 1, 20)).await;
    pay(bag_sold, client_giulia, 40_000, PaymentMethod::Cash, day(2026, 2, 3)).await;
    pay(shoes_sold, client_marco, 40_000, PaymentMethod::Cash, day(2026, 1, 25)).await;
    pay(
        watch_sold,
        client_anna,
        60_000,
        PaymentMethod::BankTransfer,
        day(2026, 2, 10),
    )
    .await;

    let expenses: Vec<(Option<Uuid>, &str, i64, &str)> = vec![
        (Some(bag_sold), "cleaning", 2_000, "2026-01-22"),
        (None, "rent", 5_000, "2026-01-15"),
        (Some(watch_sold), "repair", 1_000, "2026-03-01"),
    ];
    for (item, kind, amount, incurred) in expenses {
        exec(
            db,
            "INSERT INTO expenses (id, item_id, kind, amount_minor, incurred_on) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                Uuid::new_v4().to_string().into(),
                item.map(|i| i.to_string()).into(),
                kind.into(),
                amount.into(),
                incurred.into(),
            ],
        )
        .await;
    }

    for (status, due_on) in [
        ("paid", "2026-01-10"),
        ("paid", "2026-01-20"),
        ("paid", "2026-02-01"),
        ("paid", "2026-02-15"),
        ("pending", "2026-03-01"),
    ] {
        exec(
            db,
            "INSERT INTO installment_plans (id, item_id, client_id, amount_minor, due_on, \
             paid_amount_minor, status) VALUES (?, ?, ?, ?, ?, ?, ?)",
            vec![
                Uuid::new_v4().to_string().into(),
                bag_sold.to_string().into(),
                client_giulia.to_string().into(),
                20_000i64.into(),
                due_on.into(),
                if status == "paid" { 20_000i64 } else { 0i64 }.into(),
                status.into(),
            ],
        )
        .await;
    }

    Seed {
        vendor_rossi,
        vendor_bianchi,
        client_giulia,
        bag_sold,
        shoes_sold,
        watch_sold,
    }
}

fn report_window() -> DateWindow {
    DateWindow::new(day(2026, 1, 1), day(2026, 2, 28)).unwrap()
}

#[tokio::test]
async fn kpi_report_over_the_seeded_ledger() {
    let (engine, db) = engine_with_db().await;
    seed_ledger(&engine, &db).await;

    let report = engine
        .kpi_report(&report_window(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.revenue, MoneyCents::new(200_000));
    // Max cost once per paid item: 500 + 200 + 300.
    assert_eq!(report.cogs, MoneyCents::new(100_000));
    assert_eq!(report.gross_profit, MoneyCents::new(100_000));
    assert_eq!(report.gross_margin_pct, 50.0);
    // Only the in-window cleaning expense counts; the general expense and
    // the March repair do not.
    assert_eq!(report.total_expenses, MoneyCents::new(2_000));
    assert_eq!(report.net_profit, MoneyCents::new(98_000));
    assert_eq!(report.net_margin_pct, 49.0);
    assert_eq!(report.items_sold, 3);
    assert_eq!(report.payment_count, 4);
    assert_eq!(report.unique_clients, 3);
    assert_eq!(report.average_order_value, MoneyCents::new(50_000));
    // (15 + 15 + 71) / 3 days.
    assert_eq!(report.average_days_to_sell, 33.67);
    // 2000 / (1000 / 3).
    assert_eq!(report.inventory_turnover, 6.0);
}

#[tokio::test]
async fn empty_window_yields_zeroed_report() {
    let (engine, db) = engine_with_db().await;
    seed_ledger(&engine, &db).await;

    let window = DateWindow::new(day(2027, 1, 1), day(2027, 1, 31)).unwrap();
    let report = engine
        .kpi_report(&window, &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.revenue, MoneyCents::ZERO);
    assert_eq!(report.gross_margin_pct, 0.0);
    assert_eq!(report.net_margin_pct, 0.0);
    assert_eq!(report.average_order_value, MoneyCents::ZERO);
    assert_eq!(report.items_sold, 0);
}

#[tokio::test]
async fn dimension_filters_restrict_the_report() {
    let (engine, db) = engine_with_db().await;
    let seed = seed_ledger(&engine, &db).await;

    let vendor_filter = ReportFilter {
        vendor_ids: vec![seed.vendor_bianchi],
        ..ReportFilter::default()
    };
    let report = engine
        .kpi_report(&report_window(), &vendor_filter)
        .await
        .unwrap();
    assert_eq!(report.revenue, MoneyCents::new(60_000));
    assert_eq!(report.cogs, MoneyCents::new(30_000));
    assert_eq!(report.items_sold, 1);

    let client_filter = ReportFilter {
        client_ids: vec![seed.client_giulia],
        ..ReportFilter::default()
    };
    let report = engine
        .kpi_report(&report_window(), &client_filter)
        .await
        .unwrap();
    assert_eq!(report.revenue, MoneyCents::new(100_000));
    assert_eq!(report.payment_count, 2);
    assert_eq!(report.items_sold, 1);
}

#[tokio::test]
async fn monthly_series_partitions_the_kpi_totals() {
    let (engine, db) = engine_with_db().await;
    seed_ledger(&engine, &db).await;
    let window = report_window();
    let filter = ReportFilter::default();

    let kpi = engine.kpi_report(&window, &filter).await.unwrap();

    let revenue = engine
        .time_series(SeriesMetric::Revenue, Granularity::Month, &window, &filter)
        .await
        .unwrap();
    assert_eq!(revenue.len(), 2);
    assert_eq!(revenue[0].period_start, day(2026, 1, 1));
    assert_eq!(revenue[1].period_start, day(2026, 2, 1));
    let total: f64 = revenue.iter().map(|p| p.value).sum();
    assert!((total - kpi.revenue.to_major()).abs() < 1e-6);

    let payments = engine
        .time_series(SeriesMetric::Payments, Granularity::Month, &window, &filter)
        .await
        .unwrap();
    let total: f64 = payments.iter().map(|p| p.value).sum();
    assert_eq!(total, kpi.payment_count as f64);

    // Daily partition sums to the same revenue.
    let daily = engine
        .time_series(SeriesMetric::Revenue, Granularity::Day, &window, &filter)
        .await
        .unwrap();
    assert_eq!(daily.len(), 59);
    let total: f64 = daily.iter().map(|p| p.value).sum();
    assert!((total - kpi.revenue.to_major()).abs() < 1e-6);
}

#[tokio::test]
async fn grouped_revenue_sums_to_the_kpi_revenue() {
    let (engine, db) = engine_with_db().await;
    let seed = seed_ledger(&engine, &db).await;
    let window = report_window();
    let filter = ReportFilter::default();

    let kpi = engine.kpi_report(&window, &filter).await.unwrap();

    for group_by in [GroupBy::Vendor, GroupBy::Client, GroupBy::Brand, GroupBy::Category] {
        let rows = engine
            .grouped_metrics(group_by, &[GroupMetric::Revenue], &window, &filter)
            .await
            .unwrap();
        let total: MoneyCents = rows.iter().filter_map(|row| row.revenue).sum();
        assert_eq!(total, kpi.revenue, "grouped by {}", group_by.as_str());
    }

    let rows = engine
        .grouped_metrics(
            GroupBy::Vendor,
            &[GroupMetric::Revenue, GroupMetric::Profit, GroupMetric::ItemsSold],
            &window,
            &filter,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, Some(seed.vendor_rossi));
    assert_eq!(rows[0].label, "Atelier Rossi");
    assert_eq!(rows[0].revenue, Some(MoneyCents::new(140_000)));
    // 1400 − (500 + 20) − 200.
    assert_eq!(rows[0].profit, Some(MoneyCents::new(68_000)));
    assert_eq!(rows[0].items_sold, Some(2));
    assert_eq!(rows[1].label, "Casa Bianchi");
    assert_eq!(rows[1].profit, Some(MoneyCents::new(30_000)));

    let rows = engine
        .grouped_metrics(GroupBy::Brand, &[GroupMetric::Revenue], &window, &filter)
        .await
        .unwrap();
    assert_eq!(rows[0].label, "Prada");
    assert_eq!(rows[0].revenue, Some(MoneyCents::new(160_000)));
    assert_eq!(rows[1].key, None);
    assert_eq!(rows[1].label, "Unknown Brand");
    assert_eq!(rows[1].revenue, Some(MoneyCents::new(40_000)));
}

#[tokio::test]
async fn profitability_pages_concatenate_to_the_full_ranking() {
    let (engine, db) = engine_with_db().await;
    let seed = seed_ledger(&engine, &db).await;
    let window = report_window();
    let filter = ReportFilter::default();

    let full = engine
        .item_profitability(&window, &filter, 100, 0)
        .await
        .unwrap();
    assert_eq!(full.total, 3);
    assert_eq!(full.rows[0].item_id, seed.bag_sold);
    assert_eq!(full.rows[0].revenue, MoneyCents::new(100_000));
    // 500 max cost + 20 cleaning.
    assert_eq!(full.rows[0].cost, MoneyCents::new(52_000));
    assert_eq!(full.rows[0].profit, MoneyCents::new(48_000));
    assert_eq!(full.rows[0].margin_pct, 48.0);
    assert_eq!(full.rows[0].sold_on, Some(day(2026, 1, 20)));
    assert_eq!(full.rows[0].days_to_sell, Some(15));
    assert_eq!(full.rows[1].item_id, seed.watch_sold);
    assert_eq!(full.rows[2].item_id, seed.shoes_sold);

    let mut paged = Vec::new();
    let mut offset = 0;
    loop {
        let page = engine
            .item_profitability(&window, &filter, 2, offset)
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        if page.rows.is_empty() {
            break;
        }
        paged.extend(page.rows.into_iter().map(|row| row.item_id));
        offset += 2;
    }
    let expected: Vec<Uuid> = full.rows.iter().map(|row| row.item_id).collect();
    assert_eq!(paged, expected);
}

#[tokio::test]
async fn inventory_health_counts_and_values_the_floor() {
    let (engine, db) = engine_with_db().await;
    seed_ledger(&engine, &db).await;

    let report = engine
        .inventory_health(&ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(report.status_counts.get("sold"), Some(&3));
    assert_eq!(report.status_counts.get("in_store"), Some(&1));
    // Only the lamp is still on the floor, valued at its max price.
    assert_eq!(report.total_value, MoneyCents::new(20_000));
    assert_eq!(report.aging.over_180, 1);
    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].label, "Bags");
    assert_eq!(report.categories[0].count, 1);

    // Status filters apply to the item set.
    let sold_only = ReportFilter {
        statuses: vec![ItemStatus::Sold],
        ..ReportFilter::default()
    };
    let report = engine.inventory_health(&sold_only).await.unwrap();
    assert_eq!(report.status_counts.get("sold"), Some(&3));
    assert_eq!(report.status_counts.get("in_store"), None);
    assert_eq!(report.total_value, MoneyCents::ZERO);
}

#[tokio::test]
async fn payment_method_breakdown_shares_the_grand_total() {
    let (engine, db) = engine_with_db().await;
    seed_ledger(&engine, &db).await;

    let rows = engine
        .payment_method_breakdown(&report_window(), &ReportFilter::default())
        .await
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].method, PaymentMethod::Cash);
    assert_eq!(rows[0].amount, MoneyCents::new(80_000));
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[0].share_pct, 40.0);
    assert_eq!(rows[0].average_amount, MoneyCents::new(40_000));
    let share_total: f64 = rows.iter().map(|row| row.share_pct).sum();
    assert!((share_total - 100.0).abs() < 0.02);
}

#[tokio::test]
async fn dashboard_reflects_the_whole_ledger() {
    let (engine, db) = engine_with_db().await;
    let seed = seed_ledger(&engine, &db).await;

    let summary = engine.dashboard_summary().await.unwrap();
    assert_eq!(summary.total_revenue, MoneyCents::new(200_000));
    assert_eq!(summary.active_items, 1);
    // Cost ranges of the three sold, unpaid-out items.
    assert_eq!(
        summary.pending_payouts,
        engine::CentsRange::from_cents(80_000, 100_000)
    );
    assert_eq!(summary.incoming_payments, MoneyCents::new(200_000));
    // All three were collected in full at their max price.
    assert_eq!(summary.upcoming_payouts, MoneyCents::new(100_000));
    // 2000 − 80 (all expenses) − [800, 1000], bounds inverted.
    assert_eq!(
        summary.net_profit,
        engine::CentsRange::from_cents(92_000, 112_000)
    );
    assert_eq!(summary.in_store_cost, engine::CentsRange::from_cents(5_000, 8_000));
    assert_eq!(
        summary.in_store_value,
        engine::CentsRange::from_cents(15_000, 20_000)
    );

    // The summary is handed to the presentation layer as JSON.
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["total_revenue"], 200_000);
    assert_eq!(json["net_profit"]["min"], 92_000);

    // Paying one vendor out moves that item off the pending totals.
    engine
        .create_payout(seed.shoes_sold, Utc::now(), None, None)
        .await
        .unwrap();
    let summary = engine.dashboard_summary().await.unwrap();
    assert_eq!(
        summary.pending_payouts,
        engine::CentsRange::from_cents(70_000, 80_000)
    );
    assert_eq!(summary.upcoming_payouts, MoneyCents::new(80_000));
}

#[tokio::test]
async fn financial_health_over_the_seeded_ledger() {
    let (engine, db) = engine_with_db().await;
    seed_ledger(&engine, &db).await;

    let report = engine.financial_health().await.unwrap();

    // 4 of 5 installments paid.
    assert_eq!(report.factors.payment_timeliness, 80.0);
    // 3 of 4 items sold.
    assert_eq!(report.factors.inventory_turnover, 75.0);
    // The seeded payments predate any 30-day window by the time tests run,
    // so cash flow sits at the neutral default.
    assert_eq!(report.factors.cash_flow, 50.0);
    // 1 of 3 paying clients came back.
    assert_eq!(report.factors.client_retention, 33.33);
    // (2000 − 0 payouts − 80 expenses) / 2000.
    assert_eq!(report.factors.profit_margin, 96.0);
    assert_eq!(report.score, 71);
    assert_eq!(report.grade, "B");
    // Cash flow and retention sit under their thresholds.
    assert_eq!(report.recommendations.len(), 2);
}

#[tokio::test]
async fn overdue_installments_are_computed_at_query_time() {
    let (engine, db) = engine_with_db().await;
    seed_ledger(&engine, &db).await;

    let overdue = engine
        .list_overdue_installments(Utc::now().date_naive())
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].due_on, day(2026, 3, 1));

    // Nothing is overdue from the vantage point of early January.
    let overdue = engine
        .list_overdue_installments(day(2026, 1, 1))
        .await
        .unwrap();
    assert!(overdue.is_empty());
}
