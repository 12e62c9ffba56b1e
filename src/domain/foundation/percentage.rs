//! Percentage value object (0-100 scale).
//!
//! Sentiment score and confidence travel to the ledger as whole percents.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// A value between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u8);

impl Percentage {
    /// Zero percent.
    pub const ZERO: Self = Self(0);

    /// One hundred percent.
    pub const HUNDRED: Self = Self(100);

    /// Creates a new Percentage, clamping to valid range.
    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    /// Creates a Percentage, returning error if out of range.
    pub fn try_new(value: u8) -> Result<Self, ValidationError> {
        if value > 100 {
            return Err(ValidationError::out_of_range(
                "percentage",
                0,
                100,
                i32::from(value),
            ));
        }
        Ok(Self(value))
    }

    /// Scales a fraction in `[0, 1]` to a whole percent, rounding half up.
    ///
    /// `x * 100` is first snapped to six decimals so binary artifacts such
    /// as `0.145 * 100 = 14.499999...` still round to 15. Inputs outside the
    /// unit interval clamp; NaN maps to zero.
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction.is_nan() {
            return Self::ZERO;
        }
        let scaled = (fraction * 100.0 * 1e6).round() / 1e6;
        let rounded = (scaled + 0.5).floor().clamp(0.0, 100.0);
        // Clamped above, so the cast cannot truncate.
        Self(rounded as u8)
    }

    /// Returns the value as u8.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Returns the value as a fraction (0.0 to 1.0).
    pub fn as_fraction(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percentage_new_clamps_to_100() {
        assert_eq!(Percentage::new(101).value(), 100);
        assert_eq!(Percentage::new(255).value(), 100);
    }

    #[test]
    fn percentage_try_new_rejects_over_100() {
        assert!(matches!(
            Percentage::try_new(101),
            Err(ValidationError::OutOfRange { actual: 101, .. })
        ));
    }

    #[test]
    fn from_fraction_rounds_half_up() {
        assert_eq!(Percentage::from_fraction(0.805).value(), 81);
        assert_eq!(Percentage::from_fraction(0.145).value(), 15);
        assert_eq!(Percentage::from_fraction(0.804).value(), 80);
        assert_eq!(Percentage::from_fraction(0.8).value(), 80);
        assert_eq!(Percentage::from_fraction(0.9).value(), 90);
    }

    #[test]
    fn from_fraction_hits_bounds() {
        assert_eq!(Percentage::from_fraction(0.0), Percentage::ZERO);
        assert_eq!(Percentage::from_fraction(1.0), Percentage::HUNDRED);
        assert_eq!(Percentage::from_fraction(1.7), Percentage::HUNDRED);
        assert_eq!(Percentage::from_fraction(-0.2), Percentage::ZERO);
        assert_eq!(Percentage::from_fraction(f64::NAN), Percentage::ZERO);
    }

    proptest! {
        #[test]
        fn scaled_value_is_within_one_of_exact_percent(x in 0.0f64..=1.0) {
            let scaled = f64::from(Percentage::from_fraction(x).value());
            prop_assert!((scaled - x * 100.0).abs() <= 1.0);
            prop_assert!(scaled <= 100.0);
        }
    }
}
