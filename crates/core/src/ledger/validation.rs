//! Business rule validation for ledger operations.

use rust_decimal::Decimal;
use tally_shared::types::{JournalEntryId, Tolerance};

use super::error::{LedgerError, LineRejection};
use super::types::BalanceTotals;

/// Largest amount a single line may carry: one quadrillion.
pub const MAX_LINE_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Validates the amounts of a single line.
///
/// A line carries exactly one non-zero, non-negative side, no larger than
/// [`MAX_LINE_AMOUNT`].
///
/// # Errors
///
/// Returns the reason the amounts were rejected.
pub fn validate_line_amounts(debit: Decimal, credit: Decimal) -> Result<(), LineRejection> {
    if debit < Decimal::ZERO || credit < Decimal::ZERO {
        return Err(LineRejection::NegativeAmount);
    }
    if debit > MAX_LINE_AMOUNT || credit > MAX_LINE_AMOUNT {
        return Err(LineRejection::TooLarge);
    }

    match (debit.is_zero(), credit.is_zero()) {
        (false, false) => Err(LineRejection::BothSides),
        (true, true) => Err(LineRejection::NoAmount),
        _ => Ok(()),
    }
}

/// Validates that an entry's totals balance within the tolerance.
///
/// # Errors
///
/// Returns `NotBalanced` with both totals when they differ too much.
pub fn validate_balance(
    entry_id: JournalEntryId,
    totals: BalanceTotals,
    tolerance: Tolerance,
) -> Result<(), LedgerError> {
    if totals.is_balanced(tolerance) {
        Ok(())
    } else {
        Err(LedgerError::NotBalanced {
            entry_id,
            debit: totals.total_debit,
            credit: totals.total_credit,
        })
    }
}

/// Validates that a required text field is not blank.
///
/// # Errors
///
/// Returns `MissingField` naming the field.
pub fn require_text(field: &'static str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        Err(LedgerError::MissingField(field))
    } else {
        Ok(())
    }
}
