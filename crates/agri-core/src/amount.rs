//! # Decimal Bounds
//!
//! Areas, yields, prices and totals are stored in fixed-point columns. A
//! value with more fractional digits or a larger magnitude than its column
//! allows is rejected before it reaches the store, so what is kept in memory
//! is exactly what the database holds.

use rust_decimal::Decimal;

use crate::error::FieldErrors;

/// Precision and scale of a fixed-point column (`NUMERIC(precision, scale)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalBound {
    pub precision: u32,
    pub scale: u32,
}

impl DecimalBound {
    /// `NUMERIC(14, 2)`: plot areas, yields and unit prices.
    pub const QUANTITY: Self = Self {
        precision: 14,
        scale: 2,
    };

    /// `NUMERIC(16, 2)`: expense totals.
    pub const TOTAL: Self = Self {
        precision: 16,
        scale: 2,
    };

    /// Exclusive upper bound on the magnitude of a value.
    pub fn limit(&self) -> Decimal {
        Decimal::from_i128_with_scale(10i128.pow(self.precision - self.scale), 0)
    }

    pub fn fits(&self, value: Decimal) -> bool {
        value.normalize().scale() <= self.scale && value.abs() < self.limit()
    }

    /// Record on `field` why `value` does not fit, if it does not.
    pub fn check(&self, errors: &mut FieldErrors, field: &str, value: Decimal) {
        if value.normalize().scale() > self.scale {
            errors.invalid(field, format!("must have at most {} decimal places", self.scale));
        } else if value.abs() >= self.limit() {
            errors.invalid(field, format!("must be less than {}", self.limit()));
        }
    }
}
