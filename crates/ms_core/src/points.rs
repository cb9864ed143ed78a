//! Championship points as integer hundredths.
//!
//! Each per-discipline value is rounded to two decimals when it enters the
//! type, so a competitor total is exactly the sum of the rounded
//! per-discipline values. Summing hundredths as integers keeps
//! `ceil(total)` free of float drift (`750.00 + 600.00` never becomes
//! `1350.0000000001`).

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Points(i64);

impl Points {
    pub const ZERO: Points = Points(0);

    /// Round `value` to two decimals (half away from zero). Non-finite input yields zero.
    pub fn from_f64_rounded(value: f64) -> Points {
        if !value.is_finite() {
            return Points::ZERO;
        }
        let scaled = (value * 100.0).round();
        // Saturate rather than wrap on absurd inputs.
        if scaled >= i64::MAX as f64 {
            Points(i64::MAX)
        } else if scaled <= i64::MIN as f64 {
            Points(i64::MIN)
        } else {
            Points(scaled as i64)
        }
    }

    pub const fn from_hundredths(h: i64) -> Points { Points(h) }

    pub const fn hundredths(self) -> i64 { self.0 }

    /// Two-decimal value as `f64`.
    pub fn as_f64(self) -> f64 { self.0 as f64 / 100.0 }

    /// Ceiling to a whole point (the "rounded total" shown in standings).
    pub fn ceil(self) -> i64 { self.0.saturating_add(99).div_euclid(100) }
}

impl Add for Points {
    type Output = Points;
    fn add(self, rhs: Points) -> Points { Points(self.0.saturating_add(rhs.0)) }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Points) { *self = *self + rhs; }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Points>>(iter: I) -> Points {
        iter.fold(Points::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Points> for Points {
    fn sum<I: Iterator<Item = &'a Points>>(iter: I) -> Points {
        iter.copied().sum()
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(Points::from_f64_rounded(28.846_153).hundredths(), 2885);
        assert_eq!(Points::from_f64_rounded(2.5).hundredths(), 250);
        assert_eq!(Points::from_f64_rounded(0.125).hundredths(), 13);
    }

    #[test]
    fn non_finite_is_zero() {
        assert_eq!(Points::from_f64_rounded(f64::NAN), Points::ZERO);
        assert_eq!(Points::from_f64_rounded(f64::INFINITY), Points::ZERO);
    }

    #[test]
    fn ceil_matches_math_ceil() {
        assert_eq!(Points::from_hundredths(135_000).ceil(), 1350);
        assert_eq!(Points::from_hundredths(135_001).ceil(), 1351);
        assert_eq!(Points::from_hundredths(2885).ceil(), 29);
        assert_eq!(Points::from_hundredths(-150).ceil(), -1);
        assert_eq!(Points::ZERO.ceil(), 0);
    }

    #[test]
    fn saturated_points_still_ceil() {
        let huge = Points::from_f64_rounded(1e18 * 100.0);
        assert_eq!(huge, Points::from_hundredths(i64::MAX));
        assert_eq!(huge.ceil(), i64::MAX / 100);
        assert_eq!((huge + Points::from_hundredths(500)).ceil(), i64::MAX / 100);
    }

    #[test]
    fn sum_is_exact() {
        let parts = [0.1, 0.2, 0.7].map(Points::from_f64_rounded);
        let total: Points = parts.iter().sum();
        assert_eq!(total, Points::from_hundredths(100));
        assert_eq!(total.ceil(), 1);
    }

    #[test]
    fn display_two_decimals() {
        assert_eq!(Points::from_hundredths(75_000).to_string(), "750.00");
        assert_eq!(Points::from_hundredths(5).to_string(), "0.05");
        assert_eq!(Points::from_hundredths(-250).to_string(), "-2.50");
    }
}
