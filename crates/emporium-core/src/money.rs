//! # Money Module
//!
//! Prices and cart totals are integer minor units (cents). Nothing in the
//! workspace converts money to or from floating point.
//!
//! ## Where Money Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  products.price_cents ──► Product.price ──► CartItem.price              │
//! │                                                  │                      │
//! │                                                  ▼  × qty               │
//! │                                          CartItem::line_cost()          │
//! │                                                  │                      │
//! │                                                  ▼  Σ (Sum)             │
//! │                                            Cart::total_cost()           │
//! │                                                  │                      │
//! │                                                  ▼                      │
//! │                                     carts.total_cost_cents              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use emporium_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! let line = price * 3;
//! assert_eq!(line.cents(), 3297);
//!
//! let total: Money = [line, Money::from_cents(3)].into_iter().sum();
//! assert_eq!(total.to_string(), "33.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the smallest currency unit.
///
/// Serialized as a bare integer so stored and transported values stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const MAX: Money = Money(i64::MAX);

    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Cost of `qty` units at this price, clamped at the `i64` bounds.
    ///
    /// Use [`Money::checked_times`] where an out-of-range result must be
    /// rejected rather than stored.
    ///
    /// ## Example
    /// ```rust
    /// use emporium_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(10).times(3), Money::from_cents(30));
    /// assert_eq!(Money::from_cents(100).times(i64::MAX), Money::MAX);
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Money {
        Money(self.0.saturating_mul(qty))
    }

    /// Cost of `qty` units, or `None` if it does not fit in an `i64`.
    #[inline]
    pub const fn checked_times(&self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders major.minor without a currency symbol; localisation belongs to the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

/// Saturating; see [`Money::checked_add`].
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.times(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_mul_agree() {
        let price = Money::from_cents(250);
        assert_eq!(price.times(4), price * 4);
        assert_eq!((price * 4).cents(), 1000);
    }

    #[test]
    fn test_overflow_saturates_or_is_reported() {
        let price = Money::from_cents(100);
        let qty = i64::MAX / 10;

        assert_eq!(price.checked_times(qty), None);
        assert_eq!(price.times(qty), Money::MAX);
        assert_eq!(Money::MAX.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::MAX + Money::from_cents(1), Money::MAX);

        let total: Money = [Money::MAX, Money::MAX].into_iter().sum();
        assert_eq!(total, Money::MAX);
        assert_eq!(price.checked_times(3), Some(Money::from_cents(300)));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total: Money = Vec::<Money>::new().into_iter().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_cents(1234)).unwrap();
        assert_eq!(json, "1234");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cents(), 1234);
    }
}
