use std::{
    iter::Sum,
    ops::{Add, AddAssign},
};

use serde::Serialize;

use crate::MoneyCents;

/// Two-sided money range with defined fallback semantics.
///
/// Items carry their cost and listed price as `[min, max]` ranges, and the
/// stored bounds are nullable. The rules, applied uniformly wherever a
/// range is read:
///
/// - a missing bound falls back to the other bound;
/// - when both bounds are missing the range is zero.
///
/// Upstream services *should* keep `min <= max` but do not always enforce
/// it; the range stores what it is given and never swaps bounds silently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CentsRange {
    min: MoneyCents,
    max: MoneyCents,
}

impl CentsRange {
    pub const ZERO: CentsRange = CentsRange {
        min: MoneyCents::ZERO,
        max: MoneyCents::ZERO,
    };

    /// Builds a range from nullable stored bounds, applying the fallback
    /// rules above.
    #[must_use]
    pub fn new(min_cents: Option<i64>, max_cents: Option<i64>) -> Self {
        let (min, max) = match (min_cents, max_cents) {
            (Some(min), Some(max)) => (min, max),
            (Some(min), None) => (min, min),
            (None, Some(max)) => (max, max),
            (None, None) => (0, 0),
        };
        Self {
            min: MoneyCents::new(min),
            max: MoneyCents::new(max),
        }
    }

    /// Builds a range from two known bounds.
    #[must_use]
    pub const fn from_cents(min: i64, max: i64) -> Self {
        Self {
            min: MoneyCents::new(min),
            max: MoneyCents::new(max),
        }
    }

    /// The lower bound (min, already backed by max when min was missing).
    #[must_use]
    pub const fn lower(self) -> MoneyCents {
        self.min
    }

    /// The upper bound (max, already backed by min when max was missing).
    ///
    /// This is the "preferred" single value everywhere the business reads
    /// one number out of a range: reference prices, COGS, payout bases.
    #[must_use]
    pub const fn upper(self) -> MoneyCents {
        self.max
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.min.is_zero() && self.max.is_zero()
    }
}

impl Add for CentsRange {
    type Output = CentsRange;

    fn add(self, rhs: CentsRange) -> Self::Output {
        CentsRange {
            min: self.min + rhs.min,
            max: self.max + rhs.max,
        }
    }
}

impl AddAssign for CentsRange {
    fn add_assign(&mut self, rhs: CentsRange) {
        self.min += rhs.min;
        self.max += rhs.max;
    }
}

impl Sum for CentsRange {
    fn sum<I: Iterator<Item = CentsRange>>(iter: I) -> Self {
        iter.fold(CentsRange::ZERO, |acc, v| acc + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bound_falls_back_to_the_other() {
        let only_max = CentsRange::new(None, Some(500));
        assert_eq!(only_max.lower().cents(), 500);
        assert_eq!(only_max.upper().cents(), 500);

        let only_min = CentsRange::new(Some(300), None);
        assert_eq!(only_min.lower().cents(), 300);
        assert_eq!(only_min.upper().cents(), 300);
    }

    #[test]
    fn both_missing_is_zero() {
        let range = CentsRange::new(None, None);
        assert!(range.is_zero());
        assert_eq!(range.upper(), MoneyCents::ZERO);
    }

    #[test]
    fn sums_bound_by_bound() {
        let total: CentsRange = [
            CentsRange::from_cents(100, 200),
            CentsRange::new(None, Some(50)),
            CentsRange::new(Some(30), None),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, CentsRange::from_cents(180, 280));
    }
}
