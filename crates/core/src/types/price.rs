//! Decimal money amounts.
//!
//! The backend speaks plain JSON numbers for prices and wallet values; the
//! client keeps them as [`Decimal`] so cart totals never pick up float drift.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A money amount in the store's single currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0.round_dp(2))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_pads_to_cents() {
        assert_eq!(Price::new(Decimal::new(5, 0)).to_string(), "$5.00");
        assert_eq!(Price::new(Decimal::new(1999, 2)).to_string(), "$19.99");
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::new(Decimal::new(250, 2));
        let total: Price = [unit.times(2), unit.times(3)].into_iter().sum();
        assert_eq!(total, Price::new(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_deserializes_from_json_number() {
        let price: Price = serde_json::from_str("12.5").unwrap();
        assert_eq!(price, Price::new(Decimal::new(125, 1)));

        let price: Price = serde_json::from_str("100").unwrap();
        assert_eq!(price.to_string(), "$100.00");
    }

    #[test]
    fn test_serializes_as_json_number() {
        let json = serde_json::to_string(&Price::new(Decimal::new(125, 1))).unwrap();
        assert_eq!(json, "12.5");
    }

    #[test]
    fn test_is_negative() {
        assert!(Price::new(Decimal::new(-1, 0)).is_negative());
        assert!(!Price::ZERO.is_negative());
    }
}
