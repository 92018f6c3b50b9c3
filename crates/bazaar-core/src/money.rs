//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A payment record must equal Σ(quantity × unit price) EXACTLY.          │
//! │  With floats that equality can silently break.                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (poisha)                             │
//! │    ৳12.50 is stored as 1250                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bazaar_core::money::Money;
//!
//! let price = Money::from_minor(1250); // ৳12.50
//! let total = price.checked_mul(3).unwrap();
//! assert_eq!(total.minor(), 3750);
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► OrderLine.unit_price_cents (snapshot)
///                                  │
///                                  ▼ × quantity
///                         PaymentRecord.amount_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Errors
    /// [`ValidationError::Overflow`] if the line total does not fit in i64.
    ///
    /// ## Example
    /// ```rust
    /// use bazaar_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.checked_mul(3).unwrap().minor(), 897);
    /// assert!(Money::from_minor(i64::MAX).checked_mul(2).is_err());
    /// ```
    pub fn checked_mul(&self, quantity: i64) -> Result<Money, ValidationError> {
        self.0
            .checked_mul(quantity)
            .map(Money)
            .ok_or_else(|| ValidationError::Overflow {
                field: "total_amount".to_string(),
            })
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation, for logs and debugging.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}৳{}.{:02}",
            sign,
            self.major_part().abs(),
            self.minor_part()
        )
    }
}

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
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major_part(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1250).to_string(), "৳12.50");
        assert_eq!(Money::from_minor(5).to_string(), "৳0.05");
        assert_eq!(Money::from_minor(-550).to_string(), "-৳5.50");
    }

    #[test]
    fn test_checked_mul() {
        assert_eq!(Money::from_minor(1250).checked_mul(3).unwrap().minor(), 3750);
        assert!(Money::from_minor(0).checked_mul(999).unwrap().is_zero());

        let err = Money::from_minor(i64::MAX / 2).checked_mul(3).unwrap_err();
        assert!(matches!(err, ValidationError::Overflow { .. }));
    }

    #[test]
    fn test_sum_of_lines() {
        let lines = [(2, 1250), (1, 300), (5, 99)];
        let total: Money = lines
            .iter()
            .map(|&(qty, price)| Money::from_minor(price).checked_mul(qty).unwrap())
            .sum();
        assert_eq!(total.minor(), 2500 + 300 + 495);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&Money::from_minor(1250)).unwrap(), "1250");
    }
}
