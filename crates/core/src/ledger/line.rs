//! Ledger line domain type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId, LedgerLineId};

use super::error::LedgerError;
use super::validation::validate_line_amounts;

/// A single debit or credit line owned by one journal entry.
///
/// Exactly one of `debit`/`credit` is non-zero and neither is negative.
/// Lines can only be changed through their entry while it is a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    id: LedgerLineId,
    journal_entry_id: JournalEntryId,
    account_id: AccountId,
    debit: Decimal,
    credit: Decimal,
    description: Option<String>,
}

impl LedgerLine {
    /// Creates a validated line for the given entry.
    pub(crate) fn new(
        journal_entry_id: JournalEntryId,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
        description: Option<String>,
    ) -> Result<Self, LedgerError> {
        validate_line_amounts(debit, credit).map_err(LedgerError::InvalidLine)?;
        Ok(Self {
            id: LedgerLineId::new(),
            journal_entry_id,
            account_id,
            debit,
            credit,
            description,
        })
    }

    pub(crate) fn set_amounts(
        &mut self,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<(), LedgerError> {
        validate_line_amounts(debit, credit).map_err(LedgerError::InvalidLine)?;
        self.debit = debit;
        self.credit = credit;
        Ok(())
    }

    /// Line id.
    #[must_use]
    pub fn id(&self) -> LedgerLineId {
        self.id
    }

    /// Owning entry.
    #[must_use]
    pub fn journal_entry_id(&self) -> JournalEntryId {
        self.journal_entry_id
    }

    /// Account the line posts to.
    #[must_use]
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Debit amount.
    #[must_use]
    pub fn debit(&self) -> Decimal {
        self.debit
    }

    /// Credit amount.
    #[must_use]
    pub fn credit(&self) -> Decimal {
        self.credit
    }

    /// Line memo.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the signed amount (positive for debit, negative for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns true for a debit line.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        !self.debit.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::error::LineRejection;
    use rust_decimal_macros::dec;

    #[test]
    fn test_debit_line() {
        let line = LedgerLine::new(
            JournalEntryId::new(),
            AccountId::new(),
            dec!(250.00),
            Decimal::ZERO,
            Some("Office rent".to_string()),
        )
        .unwrap();
        assert!(line.is_debit());
        assert_eq!(line.signed_amount(), dec!(250.00));
        assert_eq!(line.description(), Some("Office rent"));
    }

    #[test]
    fn test_credit_line_signed_amount() {
        let line = LedgerLine::new(
            JournalEntryId::new(),
            AccountId::new(),
            Decimal::ZERO,
            dec!(75.50),
            None,
        )
        .unwrap();
        assert!(!line.is_debit());
        assert_eq!(line.signed_amount(), dec!(-75.50));
    }

    #[test]
    fn test_rejects_both_sides() {
        let result = LedgerLine::new(
            JournalEntryId::new(),
            AccountId::new(),
            dec!(1),
            dec!(1),
            None,
        );
        assert!(matches!(
            result,
            Err(LedgerError::InvalidLine(LineRejection::BothSides))
        ));
    }

    #[test]
    fn test_set_amounts_keeps_line_on_rejection() {
        let mut line = LedgerLine::new(
            JournalEntryId::new(),
            AccountId::new(),
            dec!(10),
            Decimal::ZERO,
            None,
        )
        .unwrap();
        assert!(line.set_amounts(dec!(-1), Decimal::ZERO).is_err());
        assert_eq!(line.debit(), dec!(10));
        line.set_amounts(Decimal::ZERO, dec!(20)).unwrap();
        assert_eq!(line.credit(), dec!(20));
        assert_eq!(line.debit(), Decimal::ZERO);
    }
}
