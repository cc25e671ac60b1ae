//! Non-negative monetary amounts and the engine-wide comparison tolerance.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::value_object::ValueObject;

/// Absolute tolerance for every balance comparison in the engine.
pub const TOLERANCE: f64 = 1e-10;

/// `a == b` within [`TOLERANCE`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE
}

/// `x == 0` within [`TOLERANCE`].
pub fn approx_zero(x: f64) -> bool {
    x.abs() <= TOLERANCE
}

/// A finite, non-negative flow amount.
///
/// Accumulators only ever grow, so every booking is expressed as an `Amount`
/// on one side of a T-account; the sign lives in the side, not the number.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    pub fn new(value: f64) -> LedgerResult<Self> {
        if !value.is_finite() {
            return Err(LedgerError::validation(format!(
                "amount must be finite (got {value})"
            )));
        }
        if value < 0.0 {
            return Err(LedgerError::validation(format!(
                "amount must be non-negative (got {value})"
            )));
        }
        Ok(Self(value))
    }

    /// Absolute value of a signed imbalance.
    pub fn magnitude(value: f64) -> LedgerResult<Self> {
        Self::new(value.abs())
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        approx_zero(self.0)
    }
}

impl ValueObject for Amount {}

impl TryFrom<f64> for Amount {
    type Error = LedgerError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
