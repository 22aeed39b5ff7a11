//! Shared report inputs: date window, dimension filters and the ledger
//! snapshot every report shape is computed from.
//!
//! All six reports used to rebuild their own filtering and reads; they now
//! share one filter-predicate builder and one snapshot load, and each report
//! is a pure transform over the result.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    expenses, items, payments, EngineError, Expense, Item, ItemStatus, MoneyCents, Payment,
    ResultEngine,
};

use super::Engine;

/// Inclusive calendar date range `[start, end]`.
///
/// Malformed input is rejected before any computation starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        if end < start {
            return Err(EngineError::InvalidRange(format!(
                "end date {end} is earlier than start date {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses a window from ISO 8601 calendar dates (`YYYY-MM-DD`).
    pub fn parse(start: &str, end: &str) -> ResultEngine<Self> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub(crate) fn start_utc(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    pub(crate) fn end_exclusive_utc(&self) -> DateTime<Utc> {
        let next = self.end.succ_opt().unwrap_or(self.end);
        next.and_time(NaiveTime::MIN).and_utc()
    }
}

fn parse_iso_date(raw: &str) -> ResultEngine<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidRange(format!("invalid date: {raw}")))
}

/// Dimension allow-lists shared by every report. An empty list means
/// "unrestricted" for that dimension.
///
/// Vendor/brand/category/status lists restrict the item set; the client
/// list restricts payments (and has no effect on purely inventory-side
/// figures).
#[derive(Clone, Debug, Default)]
pub struct ReportFilter {
    pub vendor_ids: Vec<Uuid>,
    pub client_ids: Vec<Uuid>,
    pub brand_ids: Vec<Uuid>,
    pub category_ids: Vec<Uuid>,
    pub statuses: Vec<ItemStatus>,
}

impl ReportFilter {
    /// Parses raw identifier strings into a dimension allow-list.
    pub fn parse_ids(raw: &[String]) -> ResultEngine<Vec<Uuid>> {
        raw.iter()
            .map(|value| {
                Uuid::parse_str(value.trim())
                    .map_err(|_| EngineError::InvalidFilter(format!("invalid id: {value}")))
            })
            .collect()
    }

    /// Parses raw status strings into a status allow-list.
    pub fn parse_statuses(raw: &[String]) -> ResultEngine<Vec<ItemStatus>> {
        raw.iter()
            .map(|value| ItemStatus::try_from(value.trim()))
            .collect()
    }
}

trait ApplyItemFilters: QueryFilter + Sized {
    fn apply_item_filters(self, filter: &ReportFilter) -> Self;
}

impl<T> ApplyItemFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_item_filters(mut self, filter: &ReportFilter) -> Self {
        if !filter.vendor_ids.is_empty() {
            let ids: Vec<String> = filter.vendor_ids.iter().map(Uuid::to_string).collect();
            self = self.filter(items::Column::VendorId.is_in(ids));
        }
        if !filter.brand_ids.is_empty() {
            let ids: Vec<String> = filter.brand_ids.iter().map(Uuid::to_string).collect();
            self = self.filter(items::Column::BrandId.is_in(ids));
        }
        if !filter.category_ids.is_empty() {
            let ids: Vec<String> = filter.category_ids.iter().map(Uuid::to_string).collect();
            self = self.filter(items::Column::CategoryId.is_in(ids));
        }
        if !filter.statuses.is_empty() {
            let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
            self = self.filter(items::Column::Status.is_in(statuses));
        }
        self
    }
}

/// One consistent read of the ledger, scoped by filter and (optionally) a
/// date window.
///
/// - `items`: every item passing the dimension filters;
/// - `payments`: payments on those items, within the window when one is
///   given, restricted to allowed clients;
/// - `expenses`: item-attributed expenses on those items, within the window
///   when one is given. General expenses (no item) are not part of a
///   snapshot; whole-business figures query them separately.
///
/// A malformed stored row (unparseable id, unknown status) is skipped here
/// rather than aborting the report.
#[derive(Clone, Debug, Default)]
pub(crate) struct LedgerSnapshot {
    pub items: Vec<Item>,
    pub payments: Vec<Payment>,
    pub expenses: Vec<Expense>,
}

impl LedgerSnapshot {
    pub(crate) fn item_by_id(&self) -> HashMap<Uuid, &Item> {
        self.items.iter().map(|item| (item.id, item)).collect()
    }

    pub(crate) fn payments_by_item(&self) -> HashMap<Uuid, Vec<&Payment>> {
        let mut map: HashMap<Uuid, Vec<&Payment>> = HashMap::new();
        for payment in &self.payments {
            map.entry(payment.item_id).or_default().push(payment);
        }
        map
    }

    /// Item-attributed expense totals.
    pub(crate) fn expenses_by_item(&self) -> HashMap<Uuid, MoneyCents> {
        let mut map: HashMap<Uuid, MoneyCents> = HashMap::new();
        for expense in &self.expenses {
            if let Some(item_id) = expense.item_id {
                *map.entry(item_id).or_insert(MoneyCents::ZERO) += expense.amount;
            }
        }
        map
    }

    pub(crate) fn revenue(&self) -> MoneyCents {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

impl Engine {
    /// Loads the shared snapshot every report is computed from.
    pub(crate) async fn load_snapshot<C: ConnectionTrait>(
        &self,
        db: &C,
        filter: &ReportFilter,
        window: Option<&DateWindow>,
    ) -> ResultEngine<LedgerSnapshot> {
        let item_models = items::Entity::find()
            .apply_item_filters(filter)
            .all(db)
            .await?;
        let items: Vec<Item> = item_models
            .into_iter()
            .filter_map(|model| Item::try_from(model).ok())
            .collect();
        let item_ids: HashSet<Uuid> = items.iter().map(|item| item.id).collect();

        let mut payment_query = payments::Entity::find();
        if let Some(window) = window {
            payment_query = payment_query
                .filter(payments::Column::PaidAt.gte(window.start_utc()))
                .filter(payments::Column::PaidAt.lt(window.end_exclusive_utc()));
        }
        if !filter.client_ids.is_empty() {
            let ids: Vec<String> = filter.client_ids.iter().map(Uuid::to_string).collect();
            payment_query = payment_query.filter(payments::Column::ClientId.is_in(ids));
        }
        let payment_models = payment_query.all(db).await?;
        let payments: Vec<Payment> = payment_models
            .into_iter()
            .filter_map(|model| Payment::try_from(model).ok())
            .filter(|payment| item_ids.contains(&payment.item_id))
            .collect();

        let mut expense_query = expenses::Entity::find();
        if let Some(window) = window {
            expense_query = expense_query
                .filter(expenses::Column::IncurredOn.gte(window.start()))
                .filter(expenses::Column::IncurredOn.lte(window.end()));
        }
        let expense_models = expense_query.all(db).await?;
        let expenses: Vec<Expense> = expense_models
            .into_iter()
            .filter_map(|model| Expense::try_from(model).ok())
            .filter(|expense| {
                expense
                    .item_id
                    .is_some_and(|item_id| item_ids.contains(&item_id))
            })
            .collect();

        Ok(LedgerSnapshot {
            items,
            payments,
            expenses,
        })
    }
}
