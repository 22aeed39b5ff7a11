//! Composite financial-health score.
//!
//! Five factor scores (each 0–100) are combined with a fixed weighting into
//! an integer score, a letter grade and a set of recommendations. The
//! weighting is a single named constant: historical code paths disagreed on
//! the weights (40/25/20/10/5 vs 25/25/20/20/10 for the same factors) and
//! this module is the one place the canonical set lives.

use std::collections::HashMap;

use chrono::{Days, NaiveDate, Utc};
use sea_orm::{ConnectionTrait, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    expenses, installment_plans, items, payments, payouts, InstallmentStatus, ItemStatus,
    MoneyCents, ResultEngine,
};

use super::{
    reports::{ratio_pct, round2},
    with_tx, Engine,
};

/// Weights of the five health factors, in percent. They sum to 100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct HealthWeights {
    pub timeliness: u32,
    pub cash_flow: u32,
    pub turnover: u32,
    pub margin: u32,
    pub retention: u32,
}

/// The canonical weighting. Payment discipline dominates because missed
/// installments are the shop's main liquidity risk.
pub const HEALTH_WEIGHTS: HealthWeights = HealthWeights {
    timeliness: 40,
    cash_flow: 25,
    turnover: 20,
    margin: 10,
    retention: 5,
};

/// Factor scores, each already clamped to `[0, 100]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HealthFactors {
    /// Percentage of installment plans with status `paid`.
    pub payment_timeliness: f64,
    /// Current 30-day revenue vs the previous 30 days, scaled so that
    /// matching the previous period scores 50; capped at 100. Neutral 50
    /// when there was no prior-period revenue.
    pub cash_flow: f64,
    /// Percentage of items sold.
    pub inventory_turnover: f64,
    /// `(revenue − payouts − expenses) / revenue`, clamped for scoring.
    pub profit_margin: f64,
    /// Percentage of paying clients with more than one payment.
    pub client_retention: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinancialHealthReport {
    pub score: u32,
    pub grade: String,
    pub factors: HealthFactors,
    /// The true margin, which may be negative; the clamped value above is
    /// only for scoring.
    pub profit_margin_unclamped_pct: f64,
    pub recommendations: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct HealthInputs {
    pub installments_total: u64,
    pub installments_paid: u64,
    pub items_total: u64,
    pub items_sold: u64,
    pub current_revenue: MoneyCents,
    pub previous_revenue: MoneyCents,
    pub total_revenue: MoneyCents,
    pub total_payouts: MoneyCents,
    pub total_expenses: MoneyCents,
    pub paying_clients: u64,
    pub repeat_clients: u64,
}

fn grade_for(score: u32) -> &'static str {
    match score {
        90.. => "A+",
        80..=89 => "A",
        70..=79 => "B",
        60..=69 => "C",
        50..=59 => "D",
        _ => "F",
    }
}

pub(crate) fn compute(inputs: &HealthInputs) -> FinancialHealthReport {
    let payment_timeliness = ratio_pct(
        inputs.installments_paid as f64,
        inputs.installments_total as f64,
    )
    .clamp(0.0, 100.0);

    let cash_flow = if inputs.previous_revenue.is_positive() {
        (inputs.current_revenue.to_major() / inputs.previous_revenue.to_major() * 50.0)
            .clamp(0.0, 100.0)
    } else {
        50.0
    };

    let inventory_turnover =
        ratio_pct(inputs.items_sold as f64, inputs.items_total as f64).clamp(0.0, 100.0);

    let net = inputs.total_revenue - inputs.total_payouts - inputs.total_expenses;
    let margin_unclamped = ratio_pct(net.to_major(), inputs.total_revenue.to_major());
    let profit_margin = margin_unclamped.clamp(0.0, 100.0);

    let client_retention = ratio_pct(
        inputs.repeat_clients as f64,
        inputs.paying_clients as f64,
    )
    .clamp(0.0, 100.0);

    let weights = HEALTH_WEIGHTS;
    let weighted = payment_timeliness * weights.timeliness as f64
        + cash_flow * weights.cash_flow as f64
        + inventory_turnover * weights.turnover as f64
        + profit_margin * weights.margin as f64
        + client_retention * weights.retention as f64;
    let score = (weighted / 100.0).round().clamp(0.0, 100.0) as u32;

    let mut recommendations = Vec::new();
    if payment_timeliness < 80.0 {
        recommendations
            .push("Chase overdue installment plans to lift payment timeliness.".to_string());
    }
    if cash_flow < 60.0 {
        recommendations
            .push("Revenue is trailing the previous period; push current sales.".to_string());
    }
    if inventory_turnover < 50.0 {
        recommendations.push(
            "Inventory is moving slowly; consider markdowns or returning stale items.".to_string(),
        );
    }
    if profit_margin < 30.0 {
        recommendations
            .push("Margins are thin; review listed prices against vendor costs.".to_string());
    }
    if client_retention < 40.0 {
        recommendations
            .push("Few clients buy twice; invest in repeat-purchase outreach.".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Maintain current performance.".to_string());
    }

    FinancialHealthReport {
        score,
        grade: grade_for(score).to_string(),
        factors: HealthFactors {
            payment_timeliness: round2(payment_timeliness),
            cash_flow: round2(cash_flow),
            inventory_turnover: round2(inventory_turnover),
            profit_margin: round2(profit_margin),
            client_retention: round2(client_retention),
        },
        profit_margin_unclamped_pct: round2(margin_unclamped),
        recommendations,
    }
}

impl Engine {
    /// Recomputes the composite health score from the whole ledger.
    pub async fn financial_health(&self) -> ResultEngine<FinancialHealthReport> {
        let today = Utc::now().date_naive();
        with_tx!(self, |db_tx| {
            let inputs = self.load_health_inputs(&db_tx, today).await?;
            Ok(compute(&inputs))
        })
    }

    async fn load_health_inputs<C: ConnectionTrait>(
        &self,
        db: &C,
        today: NaiveDate,
    ) -> ResultEngine<HealthInputs> {
        let mut inputs = HealthInputs::default();

        for plan in installment_plans::Entity::find().all(db).await? {
            inputs.installments_total += 1;
            if plan.status == InstallmentStatus::Paid.as_str() {
                inputs.installments_paid += 1;
            }
        }

        for item in items::Entity::find().all(db).await? {
            inputs.items_total += 1;
            if item.status == ItemStatus::Sold.as_str() {
                inputs.items_sold += 1;
            }
        }

        let current_start = today.checked_sub_days(Days::new(30)).unwrap_or(today);
        let previous_start = today.checked_sub_days(Days::new(60)).unwrap_or(today);
        let mut payments_per_client: HashMap<Uuid, u64> = HashMap::new();
        for payment in payments::Entity::find().all(db).await? {
            let amount = MoneyCents::new(payment.amount_minor);
            inputs.total_revenue += amount;

            let paid_on = payment.paid_at.date_naive();
            if paid_on > current_start && paid_on <= today {
                inputs.current_revenue += amount;
            } else if paid_on > previous_start && paid_on <= current_start {
                inputs.previous_revenue += amount;
            }

            if let Ok(client_id) = Uuid::parse_str(&payment.client_id) {
                *payments_per_client.entry(client_id).or_insert(0) += 1;
            }
        }
        inputs.paying_clients = payments_per_client.len() as u64;
        inputs.repeat_clients = payments_per_client
            .values()
            .filter(|count| **count > 1)
            .count() as u64;

        for payout in payouts::Entity::find().all(db).await? {
            inputs.total_payouts += MoneyCents::new(payout.amount_minor);
        }
        for expense in expenses::Entity::find().all(db).await? {
            inputs.total_expenses += MoneyCents::new(expense.amount_minor);
        }

        Ok(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_of_five_installments_scores_eighty() {
        let inputs = HealthInputs {
            installments_total: 5,
            installments_paid: 4,
            ..HealthInputs::default()
        };
        let report = compute(&inputs);
        assert_eq!(report.factors.payment_timeliness, 80.0);
    }

    #[test]
    fn no_prior_revenue_defaults_cash_flow_to_neutral() {
        let inputs = HealthInputs {
            current_revenue: MoneyCents::new(50_000),
            previous_revenue: MoneyCents::ZERO,
            ..HealthInputs::default()
        };
        let report = compute(&inputs);
        assert_eq!(report.factors.cash_flow, 50.0);
    }

    #[test]
    fn three_of_ten_items_sold_scores_thirty() {
        let inputs = HealthInputs {
            items_total: 10,
            items_sold: 3,
            ..HealthInputs::default()
        };
        let report = compute(&inputs);
        assert_eq!(report.factors.inventory_turnover, 30.0);
    }

    #[test]
    fn uniform_factors_score_their_value() {
        // Every factor at 90 must give a composite of exactly 90 because
        // the weights sum to 100.
        let inputs = HealthInputs {
            installments_total: 10,
            installments_paid: 9,
            items_total: 10,
            items_sold: 9,
            // 180% of the previous period caps the factor at 90.
            current_revenue: MoneyCents::new(180_000),
            previous_revenue: MoneyCents::new(100_000),
            // all-time: margin (1_000_000 − 80_000 − 20_000) / 1_000_000 = 90%.
            total_revenue: MoneyCents::new(1_000_000),
            total_payouts: MoneyCents::new(80_000),
            total_expenses: MoneyCents::new(20_000),
            paying_clients: 10,
            repeat_clients: 9,
        };
        let report = compute(&inputs);
        assert_eq!(report.factors.cash_flow, 90.0);
        assert_eq!(report.score, 90);
        assert_eq!(report.grade, "A+");
    }

    #[test]
    fn negative_margin_is_clamped_for_scoring_but_reported() {
        let inputs = HealthInputs {
            total_revenue: MoneyCents::new(100_000),
            total_payouts: MoneyCents::new(90_000),
            total_expenses: MoneyCents::new(30_000),
            ..HealthInputs::default()
        };
        let report = compute(&inputs);
        assert_eq!(report.factors.profit_margin, 0.0);
        assert_eq!(report.profit_margin_unclamped_pct, -20.0);
    }

    #[test]
    fn grades_follow_the_score_bands() {
        assert_eq!(grade_for(95), "A+");
        assert_eq!(grade_for(90), "A+");
        assert_eq!(grade_for(85), "A");
        assert_eq!(grade_for(72), "B");
        assert_eq!(grade_for(65), "C");
        assert_eq!(grade_for(51), "D");
        assert_eq!(grade_for(30), "F");
    }

    #[test]
    fn healthy_ledger_gets_a_single_maintain_message() {
        let inputs = HealthInputs {
            installments_total: 10,
            installments_paid: 10,
            items_total: 10,
            items_sold: 8,
            current_revenue: MoneyCents::new(200_000),
            previous_revenue: MoneyCents::new(100_000),
            total_revenue: MoneyCents::new(1_000_000),
            total_payouts: MoneyCents::new(400_000),
            total_expenses: MoneyCents::new(100_000),
            paying_clients: 10,
            repeat_clients: 6,
        };
        let report = compute(&inputs);
        assert_eq!(
            report.recommendations,
            vec!["Maintain current performance.".to_string()]
        );
    }

    #[test]
    fn each_weak_factor_gets_a_recommendation() {
        let report = compute(&HealthInputs::default());
        // Timeliness, turnover, margin and retention are all 0; cash flow
        // sits at the neutral 50, still under its 60 threshold.
        assert_eq!(report.recommendations.len(), 5);
    }
}
