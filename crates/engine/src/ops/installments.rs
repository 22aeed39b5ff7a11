use chrono::NaiveDate;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{installment_plans, InstallmentPlan, InstallmentStatus, ResultEngine};

use super::{with_tx, Engine};

impl Engine {
    /// Lists installment plans that are pending past their due date.
    ///
    /// "Overdue" is computed here, never stored.
    pub async fn list_overdue_installments(
        &self,
        today: NaiveDate,
    ) -> ResultEngine<Vec<InstallmentPlan>> {
        with_tx!(self, |db_tx| {
            let rows = installment_plans::Entity::find()
                .filter(installment_plans::Column::Status.eq(InstallmentStatus::Pending.as_str()))
                .filter(installment_plans::Column::DueOn.lt(today))
                .order_by_asc(installment_plans::Column::DueOn)
                .all(&db_tx)
                .await?;

            Ok(rows
                .into_iter()
                .filter_map(|model| InstallmentPlan::try_from(model).ok())
                .collect())
        })
    }
}
