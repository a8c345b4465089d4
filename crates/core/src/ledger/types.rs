//! Ledger domain types for journal entry creation and validation.
//!
//! This module defines the value types shared by the journal entry
//! aggregate, the posting service and the persistence adapters.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, Tolerance};

use super::error::LedgerError;

/// Default source recorded on entries created without one.
pub const MANUAL_ENTRY_SOURCE: &str = "ManualEntry";

/// Journal entry status.
///
/// Entries start as `Draft` and move to `Posted` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is being drafted and can be modified.
    Draft,
    /// Entry has been posted to the ledger (immutable).
    Posted,
}

impl EntryStatus {
    /// Returns true if the entry can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Posted => write!(f, "posted"),
        }
    }
}

/// Review outcome of a journal entry.
///
/// Recorded on drafts only. Approval does not gate posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    /// Not reviewed yet.
    #[default]
    Pending,
    /// Approved by a reviewer.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Input for a single line of a new journal entry.
#[derive(Debug, Clone)]
pub struct LineInput {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount (zero when the line is a credit).
    pub debit: Decimal,
    /// Credit amount (zero when the line is a debit).
    pub credit: Decimal,
    /// Optional memo for this line.
    pub description: Option<String>,
}

impl LineInput {
    /// A debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    /// A credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Input for recording a new draft journal entry.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    /// The date the entry is booked on.
    pub date: NaiveDate,
    /// Optional external reference (e.g., invoice number).
    pub reference_number: Option<String>,
    /// A description of the entry.
    pub description: String,
    /// Originating module. Defaults to [`MANUAL_ENTRY_SOURCE`].
    pub source: Option<String>,
    /// The lines, in order.
    pub lines: Vec<LineInput>,
}

/// Partial update of a draft entry's header fields.
///
/// `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EntryUpdate {
    /// New booking date.
    pub date: Option<NaiveDate>,
    /// New reference number.
    pub reference_number: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New source.
    pub source: Option<String>,
}

/// Debit and credit totals of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
}

impl BalanceTotals {
    /// Zero totals.
    pub const ZERO: Self = Self {
        total_debit: Decimal::ZERO,
        total_credit: Decimal::ZERO,
    };

    /// Creates new totals from debit and credit sums.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }

    /// Returns true if debits and credits agree within the tolerance.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Tolerance) -> bool {
        tolerance.balances(self.total_debit, self.total_credit)
    }

    /// Adds one line's amounts.
    ///
    /// Use for the lines of a single entry, whose amounts are capped at
    /// [`MAX_LINE_AMOUNT`](super::validation::MAX_LINE_AMOUNT).
    #[must_use]
    pub fn add(self, debit: Decimal, credit: Decimal) -> Self {
        Self {
            total_debit: self.total_debit.saturating_add(debit),
            total_credit: self.total_credit.saturating_add(credit),
        }
    }

    /// Adds amounts, failing instead of leaving the decimal range.
    ///
    /// # Errors
    ///
    /// Returns `AmountOverflow` if either sum is out of range.
    pub fn checked_add(self, debit: Decimal, credit: Decimal) -> Result<Self, LedgerError> {
        Ok(Self {
            total_debit: self
                .total_debit
                .checked_add(debit)
                .ok_or(LedgerError::AmountOverflow)?,
            total_credit: self
                .total_credit
                .checked_add(credit)
                .ok_or(LedgerError::AmountOverflow)?,
        })
    }
}

impl Default for BalanceTotals {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_entry_status_editable() {
        assert!(EntryStatus::Draft.is_editable());
        assert!(!EntryStatus::Posted.is_editable());
    }

    #[test]
    fn test_balance_totals_balanced() {
        let totals = BalanceTotals::new(dec!(100.00), dec!(100.00));
        assert!(totals.is_balanced(Tolerance::penny()));
        assert_eq!(totals.difference(), Decimal::ZERO);
    }

    #[test]
    fn test_balance_totals_unbalanced() {
        let totals = BalanceTotals::new(dec!(100.00), dec!(50.00));
        assert!(!totals.is_balanced(Tolerance::penny()));
        assert_eq!(totals.difference(), dec!(50.00));
    }

    #[test]
    fn test_balance_totals_tolerance_is_strict() {
        assert!(BalanceTotals::new(dec!(100.00), dec!(99.995)).is_balanced(Tolerance::penny()));
        assert!(!BalanceTotals::new(dec!(100.00), dec!(99.99)).is_balanced(Tolerance::penny()));
    }

    #[test]
    fn test_line_input_constructors() {
        let account = AccountId::new();
        let debit = LineInput::debit(account, dec!(10));
        assert_eq!(debit.credit, Decimal::ZERO);
        let credit = LineInput::credit(account, dec!(10)).with_description("memo");
        assert_eq!(credit.debit, Decimal::ZERO);
        assert_eq!(credit.description.as_deref(), Some("memo"));
    }

    #[test]
    fn test_checked_add_reports_overflow() {
        let totals = BalanceTotals::new(Decimal::MAX, Decimal::ZERO);
        assert!(matches!(
            totals.checked_add(Decimal::ONE, Decimal::ZERO),
            Err(LedgerError::AmountOverflow)
        ));
        assert_eq!(
            BalanceTotals::ZERO.checked_add(dec!(5), dec!(3)).unwrap(),
            BalanceTotals::new(dec!(5), dec!(3))
        );
    }

    #[test]
    fn test_add_saturates() {
        let totals =
            BalanceTotals::new(Decimal::MAX, Decimal::ZERO).add(Decimal::ONE, Decimal::ONE);
        assert_eq!(totals.total_debit, Decimal::MAX);
        assert_eq!(totals.total_credit, Decimal::ONE);
    }

    #[test]
    fn test_approval_status_defaults_to_pending() {
        assert_eq!(ApprovalStatus::default(), ApprovalStatus::Pending);
        assert_eq!(ApprovalStatus::Rejected.to_string(), "rejected");
    }
}
