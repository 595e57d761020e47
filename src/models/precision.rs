use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest scale a `rust_decimal::Decimal` can carry.
pub const MAX_DECIMAL_PLACES: u32 = 28;

/// Decimal rounding policy applied to every stored input and output.
///
/// The count is decimal places after the point, not significant digits:
/// small values such as gamma at a large spot keep only a few digits.
///
/// Values are rounded half-to-even on their exact binary expansion, so the
/// same f64 always maps to the same stored value on every platform.
/// Non-finite values (the unbounded-gain sentinel, for one) pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    decimal_places: u32,
}

impl Precision {
    pub fn new(decimal_places: u32) -> Self {
        Self {
            decimal_places: decimal_places.min(MAX_DECIMAL_PLACES),
        }
    }

    #[inline]
    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    /// Round `value` to the configured number of decimal places.
    pub fn round(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        // Outside Decimal's range the value has no fractional digits left to round.
        let Some(dec) = Decimal::from_f64_retain(value) else {
            return value;
        };
        dec.round_dp_with_strategy(self.decimal_places, RoundingStrategy::MidpointNearestEven)
            .to_f64()
            .unwrap_or(value)
    }

    #[inline]
    pub fn round_opt(&self, value: Option<f64>) -> Option<f64> {
        value.map(|v| self.round(v))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(10)
    }
}
