use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};
use std::str::FromStr;

/// Money type with 8 decimal places of working precision; amounts shown to a
/// collector are rounded to cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// create from decimal
    pub fn from_decimal(d: Decimal) -> Self {
        Money(d.round_dp(8))
    }

    /// create from string with exact parsing
    pub fn from_str_exact(s: &str) -> Result<Self, rust_decimal::Error> {
        Ok(Money(Decimal::from_str(s.trim())?.round_dp(8)))
    }

    /// create from whole currency units
    pub fn from_major(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }

    /// create from cents
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// get underlying decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// round half away from zero to cents
    pub fn to_cents(&self) -> Self {
        Money(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// calculate percentage (e.g., 10% of 366.67); `None` on overflow
    pub fn percentage(&self, rate: Decimal) -> Option<Self> {
        (self.0 / Decimal::ONE_HUNDRED)
            .checked_mul(rate)
            .map(|d| Money(d.round_dp(8)))
    }

    /// apply a flat rate once (principal plus rate percent of it)
    ///
    /// `None` when the result does not fit a decimal
    pub fn with_flat_rate(&self, rate: Rate) -> Option<Self> {
        let factor = Decimal::ONE.checked_add(rate.as_decimal())?;
        self.0.checked_mul(factor).map(|d| Money(d.round_dp(8)))
    }

    pub fn checked_add(self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(|d| Money(d.round_dp(8)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::from_str_exact(s)
    }
}

impl From<Decimal> for Money {
    fn from(d: Decimal) -> Self {
        Money::from_decimal(d)
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

impl Mul<Decimal> for Money {
    type Output = Money;

    fn mul(self, other: Decimal) -> Money {
        Money((self.0 * other).round_dp(8))
    }
}

impl Div<Decimal> for Money {
    type Output = Money;

    fn div(self, other: Decimal) -> Money {
        Money((self.0 / other).round_dp(8))
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

/// rate type for interest percentages and ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Rate(Decimal);

impl Rate {
    pub const ZERO: Rate = Rate(Decimal::ZERO);

    /// create from decimal (e.g., 0.15 for 15%)
    pub fn from_decimal(d: Decimal) -> Self {
        Rate(d)
    }

    /// create from percentage (e.g., 15 or 12.5)
    pub fn from_percentage(p: impl Into<Decimal>) -> Self {
        Rate(p.into() / Decimal::from(100))
    }

    /// get as decimal
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// get as percentage
    pub fn as_percentage(&self) -> Decimal {
        (self.0 * Decimal::from(100)).normalize()
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage())
    }
}

impl From<Decimal> for Rate {
    fn from(d: Decimal) -> Self {
        Rate::from_decimal(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_precision() {
        let m = Money::from_str_exact("100.123456789").unwrap();
        assert_eq!(m.to_string(), "100.12345679"); // rounded to 8 places
    }

    #[test]
    fn test_cents_rounding() {
        let third = Money::from_major(1100) / dec!(3);
        assert_eq!(third.to_cents(), Money::from_cents(36667));

        let half = Money::from_str_exact("0.125").unwrap();
        assert_eq!(half.to_cents(), Money::from_cents(13));
    }

    #[test]
    fn test_flat_rate() {
        let capital = Money::from_major(1_000);
        assert_eq!(capital.with_flat_rate(Rate::from_percentage(10)), Some(Money::from_major(1_100)));
        assert_eq!(capital.with_flat_rate(Rate::ZERO), Some(capital));
        assert_eq!(
            capital.with_flat_rate(Rate::from_percentage(dec!(12.5))),
            Some(Money::from_major(1_125))
        );
    }

    #[test]
    fn test_overflow_is_none() {
        let huge = Money::from_decimal(Decimal::MAX);
        assert_eq!(huge.with_flat_rate(Rate::from_percentage(10)), None);
        assert_eq!(huge.with_flat_rate(Rate::ZERO), Some(huge));
        assert_eq!(huge.checked_add(Money::from_major(1)), None);
        assert_eq!(huge.percentage(dec!(200)), None);
        assert!(huge.percentage(dec!(10)).is_some());
    }

    #[test]
    fn test_percentage() {
        assert_eq!(
            Money::from_cents(36667).percentage(dec!(10)).map(|m| m.to_cents()),
            Some(Money::from_cents(3667))
        );
        assert_eq!(Money::from_major(200).percentage(Decimal::ZERO), Some(Money::ZERO));
    }

    #[test]
    fn test_sum_and_sign() {
        let total: Money = [Money::from_major(50), Money::from_cents(2550)].iter().sum();
        assert_eq!(total, Money::from_cents(7550));

        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert!((Money::ZERO - Money::from_cents(1)).is_negative());
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::from_percentage(15).to_string(), "15%");
        assert_eq!(Rate::from_percentage(dec!(7.5)).as_percentage(), dec!(7.5));
    }
}
