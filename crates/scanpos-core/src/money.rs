//! # Money Module
//!
//! Provides the `Money` type for handling yen amounts safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    999 * 0.08 = 79.92 ... sometimes 79.91999999999999                   │
//! │    Math.floor() of that can land one yen off                            │
//! │                                                                         │
//! │  OUR SOLUTION: Integer yen + basis points                               │
//! │    999 × 800 / 10000 = 79 (integer division floors)                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use scanpos_core::money::Money;
//! use scanpos_core::types::TaxRate;
//!
//! let line = Money::from_yen(333).multiply_quantity(3);
//! assert_eq!(line.yen(), 999);
//! assert_eq!(line.floor_tax(TaxRate::from_bps(800)).yen(), 79);
//! assert_eq!(Money::from_yen(1078).to_string(), "¥1,078");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole yen (JPY has no minor unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Arithmetic never has to special-case subtraction
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Transparent serde**: Serializes as a bare number, matching the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole yen.
    #[inline]
    pub const fn from_yen(yen: i64) -> Self {
        Money(yen)
    }

    /// Returns the value in whole yen.
    #[inline]
    pub const fn yen(&self) -> i64 {
        self.0
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

    /// Calculates tax and rounds DOWN to the whole yen.
    ///
    /// ## Why Floor?
    /// Receipts in the settlement system truncate fractional yen per line.
    /// This function is applied to each cart line separately; summing the
    /// floored line taxes is NOT the same as flooring the summed tax.
    ///
    /// ```text
    /// Line: ¥999 @ 8%
    ///      │
    ///      ▼
    /// floor_tax(800 bps) ← THIS FUNCTION
    ///      │  999 × 800 / 10000 = 79.92
    ///      ▼
    /// Tax: ¥79
    /// ```
    ///
    /// ## Implementation
    /// i128 prevents overflow; `div_euclid` floors toward negative infinity.
    pub fn floor_tax(&self, rate: TaxRate) -> Money {
        let tax = (self.0 as i128 * rate.bps() as i128).div_euclid(10_000);
        Money(tax as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display renders yen with thousands separators: `¥1,078`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}¥{grouped}")
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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_yen(0).to_string(), "¥0");
        assert_eq!(Money::from_yen(999).to_string(), "¥999");
        assert_eq!(Money::from_yen(1078).to_string(), "¥1,078");
        assert_eq!(Money::from_yen(1_234_567).to_string(), "¥1,234,567");
        assert_eq!(Money::from_yen(-1500).to_string(), "-¥1,500");
    }

    #[test]
    fn test_floor_tax_truncates() {
        let line = Money::from_yen(999);
        assert_eq!(line.floor_tax(TaxRate::from_bps(800)).yen(), 79);
        assert_eq!(line.floor_tax(TaxRate::from_bps(1000)).yen(), 99);
        assert_eq!(line.floor_tax(TaxRate::zero()).yen(), 0);
    }

    #[test]
    fn test_floor_tax_exact() {
        let line = Money::from_yen(1000);
        assert_eq!(line.floor_tax(TaxRate::from_bps(1000)).yen(), 100);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_yen(1000);
        let b = Money::from_yen(500);

        assert_eq!((a + b).yen(), 1500);
        assert_eq!((a - b).yen(), 500);
        assert_eq!((a * 3).yen(), 3000);

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.yen(), 2000);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::from_yen(1078)).unwrap();
        assert_eq!(json, "1078");
    }
}
