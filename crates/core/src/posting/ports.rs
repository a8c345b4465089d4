//! Persistence ports, one per aggregate.
//!
//! These traits are implemented by the store crate. Every `save` is an
//! optimistic compare-and-swap on the aggregate's `version`: an aggregate
//! with version 0 that is not stored yet is inserted, otherwise the stored
//! version must equal the given one. Success returns the new version;
//! losing the race returns `LedgerError::ConcurrencyConflict`.

use std::future::Future;

use chrono::NaiveDate;
use tally_shared::types::{AccountingPeriodId, DateRange, JournalEntryId, TrialBalanceId};

use crate::fiscal::AccountingPeriod;
use crate::ledger::{JournalEntry, LedgerError};
use crate::reports::TrialBalance;

/// Period id and version captured when a write into that period was
/// validated.
///
/// An entry save carrying a fence fails with `ConcurrencyConflict` if the
/// period's stored version has moved since, so a concurrent close forces
/// the writer to re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodFence {
    /// The owning period.
    pub period_id: AccountingPeriodId,
    /// Its version at validation time.
    pub version: u64,
}

impl PeriodFence {
    /// Captures the fence for a period.
    #[must_use]
    pub fn of(period: &AccountingPeriod) -> Self {
        Self {
            period_id: period.id(),
            version: period.version(),
        }
    }
}

/// Repository trait for journal entry persistence.
pub trait JournalEntryRepository: Send + Sync {
    /// Find an entry by ID.
    fn get(
        &self,
        id: JournalEntryId,
    ) -> impl Future<Output = Result<Option<JournalEntry>, LedgerError>> + Send;

    /// Insert or compare-and-swap an entry, optionally fenced on its period.
    fn save(
        &self,
        entry: &JournalEntry,
        fence: Option<PeriodFence>,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    /// All entries, draft or posted, dated inside the range.
    fn list_in_range(
        &self,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<JournalEntry>, LedgerError>> + Send;
}

/// Repository trait for accounting period persistence.
pub trait AccountingPeriodRepository: Send + Sync {
    /// Find a period by ID.
    fn get(
        &self,
        id: AccountingPeriodId,
    ) -> impl Future<Output = Result<Option<AccountingPeriod>, LedgerError>> + Send;

    /// Find the period whose range contains the date.
    fn find_by_date(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<AccountingPeriod>, LedgerError>> + Send;

    /// Insert or compare-and-swap a period.
    ///
    /// Fails with `OverlappingPeriod` if the period's range overlaps another
    /// stored period. When the period being saved is closed, fails with
    /// `UnpostedEntriesExist` if any draft entry is dated inside it; this
    /// check and the write happen atomically with respect to entry saves.
    fn save(
        &self,
        period: &AccountingPeriod,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;
}

/// Repository trait for trial balance persistence.
pub trait TrialBalanceRepository: Send + Sync {
    /// Find a trial balance by ID.
    fn get(
        &self,
        id: TrialBalanceId,
    ) -> impl Future<Output = Result<Option<TrialBalance>, LedgerError>> + Send;

    /// Insert or compare-and-swap a trial balance.
    fn save(
        &self,
        trial_balance: &TrialBalance,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;
}
