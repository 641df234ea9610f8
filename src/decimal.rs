use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

/// days in a year for interest proration
pub const DAYS_PER_YEAR: u32 = 365;

/// Money type with 8 decimal places precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);
    /// one hundredth of a unit (a cent, a satang)
    pub const CENT: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(8))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s)?.round_dp(8)))
    }

    /// create from integer amount (dollars, baht, etc)
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from minor amount (cents, satang, etc)
    pub fn from_minor(amount: i64, scale: u32) -> Self {
        let d = Decimal::from(amount) / Decimal::from(10_u64.pow(scale));
        Money(d.round_dp(8))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round to specified decimal places
    pub fn round_dp(&self, dp: u32) -> Self {
        Money(self.0.round_dp(dp))
    }

    /// round with midpoints going away from zero, for display figures
    pub fn round_half_up(&self, dp: u32) -> Self {
        Money(self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// simple interest at an annual percentage rate over whole days, 365-day year
    pub fn apply_rate(&self, annual_rate: Rate, days: i64) -> Self {
        let interest = self.0 * annual_rate.as_fraction() * Decimal::from(days)
            / Decimal::from(DAYS_PER_YEAR);
        Money(interest.round_dp(8))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money((self.0 + other.0).round_dp(8))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 = (self.0 + other.0).round_dp(8);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money((self.0 - other.0).round_dp(8))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 = (self.0 - other.0).round_dp(8);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + *x)
    }
}

/// annual interest rate expressed in percent (5 means 5% p.a.)
///
/// Floating spreads use the same type and may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from percentage (e.g., 5.25 for 5.25%)
    pub fn from_percent(p: Decimal) -> Self {
        Rate(p)
    }

    /// create from whole percentage points
    pub fn from_percentage(p: i32) -> Self {
        Rate(Decimal::from(p))
    }

    /// create from basis points (e.g., 525 for 5.25%)
    pub fn from_bps(bps: i32) -> Self {
        Rate(Decimal::from(bps) / Decimal::from(100))
    }

    /// create from a fraction (e.g., 0.05 for 5%)
    pub fn from_fraction(d: Decimal) -> Self {
        Rate(d * Decimal::from(100))
    }

    pub fn as_percent(&self) -> Decimal {
        self.0
    }

    pub fn as_fraction(&self) -> Decimal {
        self.0 / Decimal::from(100)
    }

    pub fn as_bps(&self) -> Decimal {
        self.0 * Decimal::from(100)
    }

    /// percentage rounded half away from zero to `dp` places, for display
    pub fn rounded_percent(&self, dp: u32) -> Decimal {
        self.0.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
    }

    /// daily fraction from annual rate over a 365-day year
    pub fn daily_fraction(&self) -> Decimal {
        self.as_fraction() / Decimal::from(DAYS_PER_YEAR)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.rounded_percent(2))
    }
}

impl Add for Rate {
    type Output = Rate;

    fn add(self, other: Rate) -> Rate {
        Rate(self.0 + other.0)
    }
}
