//! Ledger error types for validation, state, and concurrency errors.
//!
//! Every failure the posting core can produce is a variant of `LedgerError`,
//! so callers always receive a classified error kind with a readable reason.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::date_range::InvalidDateRange;
use tally_shared::types::{
    AccountId, AccountingPeriodId, JournalEntryId, LedgerLineId, TrialBalanceId,
};
use thiserror::Error;
use uuid::Uuid;

/// Why a ledger line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRejection {
    /// Debit or credit is below zero.
    NegativeAmount,
    /// Both debit and credit carry an amount.
    BothSides,
    /// Neither debit nor credit carries an amount.
    NoAmount,
    /// An amount is above [`MAX_LINE_AMOUNT`](super::validation::MAX_LINE_AMOUNT).
    TooLarge,
}

impl std::fmt::Display for LineRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeAmount => write!(f, "amounts cannot be negative"),
            Self::BothSides => write!(f, "line must specify either debit or credit, not both"),
            Self::NoAmount => write!(f, "line must specify a debit or a credit amount"),
            Self::TooLarge => write!(f, "amount exceeds the maximum line amount"),
        }
    }
}

/// Broad error classes used for propagation and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller-fixable input problems. Never retried automatically.
    Validation,
    /// Business rule violations given the current aggregate state.
    State,
    /// The addressed aggregate does not exist.
    NotFound,
    /// Lost an optimistic concurrency race. Safe to reload and retry.
    Concurrency,
    /// Ledger invariants found broken late; needs correcting entries.
    Invariant,
    /// Storage failure or cancellation.
    Infrastructure,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Line amounts violate the one-sided, non-negative rule.
    #[error("Invalid ledger line: {0}")]
    InvalidLine(LineRejection),

    /// Journal entry is not balanced (debits != credits).
    #[error("Journal entry {entry_id} is not balanced. Debit: {debit}, Credit: {credit}")]
    NotBalanced {
        /// The entry that failed the check.
        entry_id: JournalEntryId,
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line id does not belong to the entry.
    #[error("Line {line_id} not found on journal entry {entry_id}")]
    LineNotFound {
        /// The entry that was searched.
        entry_id: JournalEntryId,
        /// The missing line.
        line_id: LedgerLineId,
    },

    /// Start date is not before end date.
    #[error("Start date {start} must be before end date {end}")]
    InvalidDateRange {
        /// Requested start date.
        start: NaiveDate,
        /// Requested end date.
        end: NaiveDate,
    },

    /// A required text field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Account has no account class, so the trial balance cannot place it.
    #[error("Account {0} has no account classification")]
    AccountNotClassified(AccountId),

    /// Summing amounts left the representable decimal range.
    #[error("Amount total is out of range")]
    AmountOverflow,

    // ========== State Errors ==========
    /// Entry was already posted.
    #[error("Journal entry {0} is already posted")]
    AlreadyPosted(JournalEntryId),

    /// Posted entries and their lines cannot change.
    #[error("Journal entry {0} is posted and cannot be modified")]
    EntryImmutable(JournalEntryId),

    /// An edit tried to post, approve or reject the entry.
    #[error("Editing journal entry {0} cannot change its status")]
    StatusChangedByEdit(JournalEntryId),

    /// Approve called on an approved entry.
    #[error("Journal entry {0} is already approved")]
    AlreadyApproved(JournalEntryId),

    /// Reject called on a rejected entry.
    #[error("Journal entry {0} is already rejected")]
    AlreadyRejected(JournalEntryId),

    /// No accounting period covers the date.
    #[error("No accounting period found for date {0}")]
    NoPeriodForDate(NaiveDate),

    /// Posting attempted against a closed period.
    #[error("Accounting period {0} is closed, no posting allowed")]
    PeriodClosed(AccountingPeriodId),

    /// Close called on a closed period.
    #[error("Accounting period {0} is already closed")]
    PeriodAlreadyClosed(AccountingPeriodId),

    /// Reopen called on an open period.
    #[error("Accounting period {0} is not closed")]
    PeriodNotClosed(AccountingPeriodId),

    /// Structural edits on a closed period.
    #[error("Accounting period {0} is closed and cannot be modified")]
    PeriodNotEditable(AccountingPeriodId),

    /// Draft entries still sit inside the period being closed.
    #[error("Cannot close accounting period {period_id}: {count} unposted journal entries")]
    UnpostedEntriesExist {
        /// The period being closed.
        period_id: AccountingPeriodId,
        /// Number of draft entries dated inside the period.
        count: usize,
    },

    /// New period overlaps an existing one.
    #[error("Accounting period overlaps with existing period: {0}")]
    OverlappingPeriod(String),

    /// Trial balance is finalized and cannot change.
    #[error("Trial balance {0} is finalized")]
    TrialBalanceFinalized(TrialBalanceId),

    // ========== Not Found Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    /// Accounting period not found.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(AccountingPeriodId),

    /// Trial balance not found.
    #[error("Trial balance not found: {0}")]
    TrialBalanceNotFound(TrialBalanceId),

    // ========== Concurrency Errors ==========
    /// Stored version moved since the aggregate was read.
    #[error("Concurrent modification of {aggregate} {id}, please retry")]
    ConcurrencyConflict {
        /// Aggregate kind, e.g. "journal entry".
        aggregate: &'static str,
        /// Aggregate id.
        id: Uuid,
    },

    // ========== Invariant Violations ==========
    /// Trial balance debits and credits differ beyond tolerance.
    #[error("Trial balance is not balanced. Debit: {debit}, Credit: {credit}")]
    TrialBalanceNotBalanced {
        /// Total debits.
        debit: Decimal,
        /// Total credits.
        credit: Decimal,
    },

    /// Assets do not equal liabilities plus equity.
    #[error(
        "Accounting equation: Assets ({assets}) != Liabilities ({liabilities}) + Equity ({equity})"
    )]
    AccountingEquationViolation {
        /// Total assets.
        assets: Decimal,
        /// Total liabilities.
        liabilities: Decimal,
        /// Total equity.
        equity: Decimal,
    },

    // ========== Infrastructure Errors ==========
    /// The operation was cancelled before committing.
    #[error("Operation cancelled before commit")]
    Cancelled,

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Builds a concurrency conflict for the given aggregate.
    #[must_use]
    pub fn conflict(aggregate: &'static str, id: impl Into<Uuid>) -> Self {
        Self::ConcurrencyConflict {
            aggregate,
            id: id.into(),
        }
    }

    /// Returns the error class.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidLine(_)
            | Self::NotBalanced { .. }
            | Self::LineNotFound { .. }
            | Self::InvalidDateRange { .. }
            | Self::MissingField(_)
            | Self::AccountNotClassified(_)
            | Self::AmountOverflow => ErrorCategory::Validation,

            Self::AlreadyPosted(_)
            | Self::EntryImmutable(_)
            | Self::StatusChangedByEdit(_)
            | Self::AlreadyApproved(_)
            | Self::AlreadyRejected(_)
            | Self::NoPeriodForDate(_)
            | Self::PeriodClosed(_)
            | Self::PeriodAlreadyClosed(_)
            | Self::PeriodNotClosed(_)
            | Self::PeriodNotEditable(_)
            | Self::UnpostedEntriesExist { .. }
            | Self::OverlappingPeriod(_)
            | Self::TrialBalanceFinalized(_) => ErrorCategory::State,

            Self::EntryNotFound(_) | Self::PeriodNotFound(_) | Self::TrialBalanceNotFound(_) => {
                ErrorCategory::NotFound
            }

            Self::ConcurrencyConflict { .. } => ErrorCategory::Concurrency,

            Self::TrialBalanceNotBalanced { .. } | Self::AccountingEquationViolation { .. } => {
                ErrorCategory::Invariant
            }

            Self::Cancelled | Self::Storage(_) => ErrorCategory::Infrastructure,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidLine(_) => "INVALID_LINE",
            Self::NotBalanced { .. } => "NOT_BALANCED",
            Self::LineNotFound { .. } => "LINE_NOT_FOUND",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::AccountNotClassified(_) => "ACCOUNT_NOT_CLASSIFIED",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::AlreadyPosted(_) => "ALREADY_POSTED",
            Self::EntryImmutable(_) => "ENTRY_IMMUTABLE",
            Self::StatusChangedByEdit(_) => "STATUS_CHANGED_BY_EDIT",
            Self::AlreadyApproved(_) => "ALREADY_APPROVED",
            Self::AlreadyRejected(_) => "ALREADY_REJECTED",
            Self::NoPeriodForDate(_) => "NO_PERIOD_FOR_DATE",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::PeriodAlreadyClosed(_) => "PERIOD_ALREADY_CLOSED",
            Self::PeriodNotClosed(_) => "PERIOD_NOT_CLOSED",
            Self::PeriodNotEditable(_) => "PERIOD_NOT_EDITABLE",
            Self::UnpostedEntriesExist { .. } => "UNPOSTED_ENTRIES_EXIST",
            Self::OverlappingPeriod(_) => "OVERLAPPING_PERIOD",
            Self::TrialBalanceFinalized(_) => "TRIAL_BALANCE_FINALIZED",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::TrialBalanceNotFound(_) => "TRIAL_BALANCE_NOT_FOUND",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::TrialBalanceNotBalanced { .. } => "TRIAL_BALANCE_NOT_BALANCED",
            Self::AccountingEquationViolation { .. } => "ACCOUNTING_EQUATION_VIOLATION",
            Self::Cancelled => "CANCELLED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.category() {
            // 400 Bad Request - validation errors
            ErrorCategory::Validation => 400,
            // 404 Not Found
            ErrorCategory::NotFound => 404,
            // 409 Conflict - concurrency errors
            ErrorCategory::Concurrency => 409,
            // 422 - business rules and broken ledger invariants
            ErrorCategory::State | ErrorCategory::Invariant => 422,
            ErrorCategory::Infrastructure => match self {
                Self::Cancelled => 499,
                _ => 500,
            },
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Concurrency
    }
}

impl From<InvalidDateRange> for LedgerError {
    fn from(err: InvalidDateRange) -> Self {
        Self::InvalidDateRange {
            start: err.start,
            end: err.end,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.category() {
            ErrorCategory::Validation => Self::Validation(message),
            ErrorCategory::State | ErrorCategory::Invariant => Self::BusinessRule(message),
            ErrorCategory::NotFound => Self::NotFound(message),
            ErrorCategory::Concurrency => Self::Conflict(message),
            ErrorCategory::Infrastructure => match err {
                LedgerError::Cancelled => Self::Cancelled(message),
                _ => Self::Storage(message),
            },
        }
    }
}
