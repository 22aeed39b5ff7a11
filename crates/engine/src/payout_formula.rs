//! Vendor payout computation.
//!
//! The shop and its vendors share sale-price risk: the vendor's payout is
//! the item's maximum cost, scaled down the further the actual sale fell
//! short of the maximum listed price. This price-adjusted formula is the
//! **single source of truth** for payout amounts; the historical flat-share
//! and plain cost-snapshot variants were retired in its favour (the cost
//! snapshot survives only as the dashboard's pending-payout *range*).

use crate::{CentsRange, MoneyCents};

/// Payout reduction per major currency unit the sale fell short of the
/// item's maximum listed price: 0.01% of the max cost per unit.
pub const SHORTFALL_RATE_PER_UNIT: f64 = 0.0001;

/// Scalar applied to the item's max cost.
///
/// `1 − shortfall × SHORTFALL_RATE_PER_UNIT`, where the shortfall is
/// `max_sales_price − collected` in major units. Clamped to `[0, 1]`: an
/// over-asking sale never pays the vendor more than the max cost, and an
/// extreme shortfall never produces a negative payout.
#[must_use]
pub fn adjustment_factor(max_sales_price: MoneyCents, collected: MoneyCents) -> f64 {
    let shortfall_units = (max_sales_price - collected).to_major();
    let factor = 1.0 - shortfall_units * SHORTFALL_RATE_PER_UNIT;
    factor.clamp(0.0, 1.0)
}

/// The vendor's payout for an item, given what was actually collected.
///
/// Monotonic in `collected`: collecting more never pays the vendor less.
/// Rounded to whole cents at this boundary only.
#[must_use]
pub fn payout_amount(cost: CentsRange, price: CentsRange, collected: MoneyCents) -> MoneyCents {
    cost.upper().scale(adjustment_factor(price.upper(), collected))
}
