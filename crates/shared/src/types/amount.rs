//! Amount tolerance used when comparing debit and credit totals.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Totals are `rust_decimal::Decimal`; equality is checked against a tolerance
//! so penny rounding from upstream systems does not block posting.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a tolerance value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToleranceError {
    /// Tolerance must be strictly positive.
    #[error("Balance tolerance must be positive, got {0}")]
    NotPositive(Decimal),
}

/// Maximum absolute difference under which two totals count as equal.
///
/// The comparison is strict: a difference of exactly the tolerance is
/// out of balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Tolerance(Decimal);

impl Tolerance {
    /// Creates a tolerance, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Result<Self, ToleranceError> {
        if value <= Decimal::ZERO {
            return Err(ToleranceError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// The default one-cent tolerance.
    #[must_use]
    pub fn penny() -> Self {
        Self(Decimal::new(1, 2))
    }

    /// Returns the tolerance value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns true if `abs(difference)` is strictly below the tolerance.
    #[must_use]
    pub fn accepts(self, difference: Decimal) -> bool {
        difference.abs() < self.0
    }

    /// Returns true if the two totals are equal within the tolerance.
    #[must_use]
    pub fn balances(self, debits: Decimal, credits: Decimal) -> bool {
        self.accepts(debits - credits)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::penny()
    }
}

impl TryFrom<Decimal> for Tolerance {
    type Error = ToleranceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Tolerance> for Decimal {
    fn from(tolerance: Tolerance) -> Self {
        tolerance.0
    }
}

impl std::fmt::Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
