//! Money value type.
//!
//! All amounts in the system are whole rupiah units stored as `i64`
//! (never floats). This module is the single place where raw amounts are
//! parsed and validated; the rest of the code passes `Money` around.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An amount of money in whole rupiah units.
///
/// The wrapper is signed: ledger deltas and admin adjustments can be
/// negative. Non-negativity of persisted balances is enforced where the
/// balance is written, not here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Minimum amount for a user-initiated transaction.
    pub const MIN_TRANSAKSI: Money = Money(1_000);

    /// Minimum target for a savings goal.
    pub const MIN_TABUNGAN_TARGET: Money = Money(10_000);

    pub const fn new(units: i64) -> Self {
        Money(units)
    }

    pub const fn units(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Addition that fails on i64 overflow instead of wrapping.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Subtraction clamped at zero. Used for savings-goal progress,
    /// which may never go below 0.
    pub fn saturating_sub_floor_zero(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses amounts arriving as strings at the API boundary.
///
/// Accepts an optional `Rp`/`Rp.` prefix and `.`/`,` thousand separators,
/// so `"Rp 50.000"`, `"50,000"` and `"-2500"` all parse.
impl FromStr for Money {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("Rp.")
            .or_else(|| s.strip_prefix("Rp"))
            .unwrap_or(s);
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| *c != '.' && *c != ',')
            .collect();
        cleaned.parse::<i64>().map(Money)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_formatted_amounts() {
        assert_eq!("50000".parse::<Money>().unwrap(), Money::new(50_000));
        assert_eq!("Rp 50.000".parse::<Money>().unwrap(), Money::new(50_000));
        assert_eq!("Rp.1,000".parse::<Money>().unwrap(), Money::new(1_000));
        assert_eq!("-2500".parse::<Money>().unwrap(), Money::new(-2_500));
        assert!("abc".parse::<Money>().is_err());
    }

    #[test]
    fn checked_arithmetic_catches_overflow() {
        let max = Money::new(i64::MAX);
        assert!(max.checked_add(Money::new(1)).is_none());
        assert_eq!(
            Money::new(30_000).checked_sub(Money::new(20_000)),
            Some(Money::new(10_000))
        );
    }

    #[test]
    fn progress_subtraction_clamps_at_zero() {
        let progres = Money::new(5_000);
        assert_eq!(
            progres.saturating_sub_floor_zero(Money::new(20_000)),
            Money::ZERO
        );
        assert_eq!(
            progres.saturating_sub_floor_zero(Money::new(2_000)),
            Money::new(3_000)
        );
    }

    #[test]
    fn negation_flips_sign() {
        assert_eq!(-Money::new(1_000), Money::new(-1_000));
        assert!((-Money::new(1_000)).is_negative());
    }
}
