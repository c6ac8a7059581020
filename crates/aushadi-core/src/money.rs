//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In JavaScript/floating point:                                      │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  A pharmacy bill is a sum of many small line totals; accumulating   │
//! │  float error across a day of sales silently corrupts the ledger.    │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Paisa                                        │
//! │    NPR 10.99 is stored as 1099 paisa (i64)                          │
//! │    Every computation is exact integer arithmetic                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use aushadi_core::money::Money;
//!
//! // Create from paisa (preferred)
//! let price = Money::from_paisa(1099); // NPR 10.99
//!
//! // Arithmetic operations
//! let line = price * 3;                          // NPR 32.97
//! let total = line + Money::from_paisa(500);     // NPR 37.97
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (paisa for NPR).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for return adjustments
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paisa (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use aushadi_core::money::Money;
    ///
    /// let price = Money::from_paisa(1099); // Represents NPR 10.99
    /// assert_eq!(price.paisa(), 1099);
    /// ```
    #[inline]
    pub const fn from_paisa(paisa: i64) -> Self {
        Money(paisa)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Returns the value in paisa (smallest currency unit).
    #[inline]
    pub const fn paisa(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion.
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paisa portion (always 0-99).
    #[inline]
    pub const fn paisa_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use aushadi_core::money::Money;
    ///
    /// let per_tab = Money::from_paisa(250); // NPR 2.50
    /// assert_eq!(per_tab.multiply_quantity(12).paisa(), 3000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money in a human-readable `NPR 10.99` format.
///
/// This is for logs and debugging. The host UI owns real formatting and
/// localization.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}NPR {}.{:02}", sign, self.rupees().abs(), self.paisa_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

/// Summing an iterator of Money values (subtotals, aggregates).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paisa() {
        let money = Money::from_paisa(1099);
        assert_eq!(money.paisa(), 1099);
        assert_eq!(money.rupees(), 10);
        assert_eq!(money.paisa_part(), 99);
    }

    #[test]
    fn test_from_rupees() {
        assert_eq!(Money::from_rupees(10).paisa(), 1000);
        assert_eq!(Money::from_rupees(-5).paisa(), -500);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_paisa(1099)), "NPR 10.99");
        assert_eq!(format!("{}", Money::from_paisa(500)), "NPR 5.00");
        assert_eq!(format!("{}", Money::from_paisa(-550)), "-NPR 5.50");
        assert_eq!(format!("{}", Money::from_paisa(0)), "NPR 0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_paisa(1000);
        let b = Money::from_paisa(500);

        assert_eq!((a + b).paisa(), 1500);
        assert_eq!((a - b).paisa(), 500);
        let tripled: Money = a * 3i64;
        assert_eq!(tripled.paisa(), 3000);
    }

    #[test]
    fn test_multiply_quantity() {
        let per_tab = Money::from_paisa(299);
        assert_eq!(per_tab.multiply_quantity(3).paisa(), 897);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 4]
            .into_iter()
            .map(Money::from_paisa)
            .sum();
        assert_eq!(total.paisa(), 354);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_paisa(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().paisa(), 100);
    }
}
