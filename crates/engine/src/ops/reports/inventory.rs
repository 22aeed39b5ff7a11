//! Inventory composition and aging.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, Utc};
use sea_orm::TransactionTrait;
use serde::Serialize;
use uuid::Uuid;

use crate::{ops::with_tx, Engine, GroupBy, Item, MoneyCents, ReportFilter, ResultEngine};

use super::round2;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryBreakdownRow {
    pub category_id: Option<Uuid>,
    pub label: String,
    pub count: u64,
    /// Sum of preferred (max) sales prices.
    pub value: MoneyCents,
    pub average_age_days: f64,
}

/// Day-count buckets since acquisition: `<30`, `30–90`, `91–180`, `>180`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AgingBuckets {
    pub under_30: u64,
    pub days_30_to_90: u64,
    pub days_91_to_180: u64,
    pub over_180: u64,
}

impl AgingBuckets {
    fn add(&mut self, age_days: i64) {
        if age_days < 30 {
            self.under_30 += 1;
        } else if age_days <= 90 {
            self.days_30_to_90 += 1;
        } else if age_days <= 180 {
            self.days_91_to_180 += 1;
        } else {
            self.over_180 += 1;
        }
    }
}

/// Point-in-time inventory report; never date-filtered.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InventoryHealthReport {
    /// Item counts per lifecycle status (every status, sold and returned
    /// included).
    pub status_counts: BTreeMap<String, u64>,
    /// Value of what is still on the floor (in-store and reserved items).
    pub total_value: MoneyCents,
    pub average_age_days: f64,
    pub categories: Vec<CategoryBreakdownRow>,
    pub aging: AgingBuckets,
}

pub(crate) fn compute(
    items: &[Item],
    names: &HashMap<Uuid, String>,
    today: NaiveDate,
) -> InventoryHealthReport {
    let mut status_counts: BTreeMap<String, u64> = BTreeMap::new();
    for item in items {
        *status_counts
            .entry(item.status.as_str().to_string())
            .or_insert(0) += 1;
    }

    let current: Vec<&Item> = items.iter().filter(|item| item.in_inventory()).collect();

    let total_value: MoneyCents = current.iter().map(|item| item.price.upper()).sum();
    let total_age: i64 = current.iter().map(|item| item.age_days(today)).sum();
    let average_age_days = if current.is_empty() {
        0.0
    } else {
        total_age as f64 / current.len() as f64
    };

    let mut aging = AgingBuckets::default();
    for item in &current {
        aging.add(item.age_days(today));
    }

    #[derive(Default)]
    struct CategoryAcc {
        count: u64,
        value: MoneyCents,
        total_age: i64,
    }
    let mut by_category: HashMap<Option<Uuid>, CategoryAcc> = HashMap::new();
    for item in &current {
        let acc = by_category.entry(item.category_id).or_default();
        acc.count += 1;
        acc.value += item.price.upper();
        acc.total_age += item.age_days(today);
    }

    let mut categories: Vec<CategoryBreakdownRow> = by_category
        .into_iter()
        .map(|(category_id, acc)| CategoryBreakdownRow {
            category_id,
            label: match category_id {
                None => "Unknown Category".to_string(),
                Some(id) => names.get(&id).cloned().unwrap_or_else(|| id.to_string()),
            },
            count: acc.count,
            value: acc.value,
            average_age_days: round2(acc.total_age as f64 / acc.count as f64),
        })
        .collect();
    categories.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));

    InventoryHealthReport {
        status_counts,
        total_value,
        average_age_days: round2(average_age_days),
        categories,
        aging,
    }
}

impl Engine {
    /// Current inventory composition under the dimension filters.
    pub async fn inventory_health(
        &self,
        filter: &ReportFilter,
    ) -> ResultEngine<InventoryHealthReport> {
        let today = Utc::now().date_naive();
        with_tx!(self, |db_tx| {
            let snapshot = self.load_snapshot(&db_tx, filter, None).await?;
            let names = self.load_names(&db_tx, GroupBy::Category).await?;
            Ok(compute(&snapshot.items, &names, today))
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use crate::{CentsRange, ItemStatus};

    use super::*;

    fn item(status: ItemStatus, age_days: i64, today: NaiveDate) -> Item {
        let acquired_on = today - chrono::Duration::days(age_days);
        Item {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            brand_id: None,
            category_id: None,
            cost: CentsRange::from_cents(1_000, 2_000),
            price: CentsRange::from_cents(5_000, 8_000),
            status,
            acquired_on,
            created_at: acquired_on.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    #[test]
    fn counts_every_status_but_values_only_inventory() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let items = vec![
            item(ItemStatus::InStore, 10, today),
            item(ItemStatus::Reserved, 40, today),
            item(ItemStatus::Sold, 100, today),
            item(ItemStatus::Returned, 300, today),
        ];

        let report = compute(&items, &HashMap::new(), today);
        assert_eq!(report.status_counts.get("in_store"), Some(&1));
        assert_eq!(report.status_counts.get("sold"), Some(&1));
        // Only the in-store and reserved items are valued.
        assert_eq!(report.total_value, MoneyCents::new(16_000));
        assert_eq!(report.average_age_days, 25.0);
    }

    #[test]
    fn aging_bucket_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let items = vec![
            item(ItemStatus::InStore, 29, today),
            item(ItemStatus::InStore, 30, today),
            item(ItemStatus::InStore, 90, today),
            item(ItemStatus::InStore, 91, today),
            item(ItemStatus::InStore, 180, today),
            item(ItemStatus::InStore, 181, today),
        ];

        let report = compute(&items, &HashMap::new(), today);
        assert_eq!(report.aging.under_30, 1);
        assert_eq!(report.aging.days_30_to_90, 2);
        assert_eq!(report.aging.days_91_to_180, 2);
        assert_eq!(report.aging.over_180, 1);
    }
}
