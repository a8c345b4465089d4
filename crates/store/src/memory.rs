//! In-memory ledger store.
//!
//! All three aggregates live behind one `RwLock`, so every write sees a
//! consistent view of the others: a fenced entry write and a period close
//! can never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tally_core::fiscal::{AccountingPeriod, PeriodStatus};
use tally_core::ledger::{JournalEntry, LedgerError};
use tally_core::posting::{
    AccountingPeriodRepository, JournalEntryRepository, PeriodFence, TrialBalanceRepository,
};
use tally_core::reports::TrialBalance;
use tally_shared::types::{AccountingPeriodId, DateRange, JournalEntryId, TrialBalanceId};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    entries: HashMap<JournalEntryId, JournalEntry>,
    periods: HashMap<AccountingPeriodId, AccountingPeriod>,
    trial_balances: HashMap<TrialBalanceId, TrialBalance>,
}

/// Thread-safe in-memory implementation of every posting port.
///
/// Cloning is cheap and yields a handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored journal entries.
    pub async fn entry_count(&self) -> usize {
        self.tables.read().await.entries.len()
    }

    /// Number of stored trial balances.
    pub async fn trial_balance_count(&self) -> usize {
        self.tables.read().await.trial_balances.len()
    }
}

/// Compares the stored version with the one the writer read.
///
/// Unstored aggregates must come in at version 0.
fn next_version(
    stored: Option<u64>,
    given: u64,
    aggregate: &'static str,
    id: impl Into<Uuid>,
) -> Result<u64, LedgerError> {
    match stored {
        None if given == 0 => Ok(1),
        Some(current) if current == given => Ok(current + 1),
        _ => {
            debug!(aggregate, ?stored, given, "Version check failed");
            Err(LedgerError::conflict(aggregate, id))
        }
    }
}

impl JournalEntryRepository for InMemoryLedgerStore {
    async fn get(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, LedgerError> {
        Ok(self.tables.read().await.entries.get(&id).cloned())
    }

    async fn save(
        &self,
        entry: &JournalEntry,
        fence: Option<PeriodFence>,
    ) -> Result<u64, LedgerError> {
        let mut tables = self.tables.write().await;

        if let Some(fence) = fence {
            let current = tables.periods.get(&fence.period_id).map(AccountingPeriod::version);
            if current != Some(fence.version) {
                debug!(
                    period_id = %fence.period_id,
                    expected = fence.version,
                    ?current,
                    "Period fence moved"
                );
                return Err(LedgerError::conflict("accounting period", fence.period_id));
            }
        }

        let stored = tables.entries.get(&entry.id()).map(JournalEntry::version);
        let version = next_version(stored, entry.version(), "journal entry", entry.id())?;

        let mut saved = entry.clone();
        saved.set_version(version);
        tables.entries.insert(saved.id(), saved);
        Ok(version)
    }

    async fn list_in_range(&self, range: DateRange) -> Result<Vec<JournalEntry>, LedgerError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<JournalEntry> = tables
            .entries
            .values()
            .filter(|entry| range.contains(entry.date()))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.date(), entry.id()));
        Ok(entries)
    }
}

impl AccountingPeriodRepository for InMemoryLedgerStore {
    async fn get(&self, id: AccountingPeriodId) -> Result<Option<AccountingPeriod>, LedgerError> {
        Ok(self.tables.read().await.periods.get(&id).cloned())
    }

    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<AccountingPeriod>, LedgerError> {
        let tables = self.tables.read().await;
        Ok(tables
            .periods
            .values()
            .find(|period| period.contains(date))
            .cloned())
    }

    async fn save(&self, period: &AccountingPeriod) -> Result<u64, LedgerError> {
        let mut tables = self.tables.write().await;

        if let Some(other) = tables
            .periods
            .values()
            .find(|other| other.id() != period.id() && other.overlaps(&period.range()))
        {
            return Err(LedgerError::OverlappingPeriod(other.name().to_string()));
        }

        if period.status() == PeriodStatus::Closed {
            let drafts = tables
                .entries
                .values()
                .filter(|entry| !entry.is_posted() && period.contains(entry.date()))
                .count();
            if drafts > 0 {
                return Err(LedgerError::UnpostedEntriesExist {
                    period_id: period.id(),
                    count: drafts,
                });
            }
        }

        let stored = tables.periods.get(&period.id()).map(AccountingPeriod::version);
        let version = next_version(stored, period.version(), "accounting period", period.id())?;

        let mut saved = period.clone();
        saved.set_version(version);
        tables.periods.insert(saved.id(), saved);
        Ok(version)
    }
}

impl TrialBalanceRepository for InMemoryLedgerStore {
    async fn get(&self, id: TrialBalanceId) -> Result<Option<TrialBalance>, LedgerError> {
        Ok(self.tables.read().await.trial_balances.get(&id).cloned())
    }

    async fn save(&self, trial_balance: &TrialBalance) -> Result<u64, LedgerError> {
        let mut tables = self.tables.write().await;

        let id = trial_balance.id();
        let stored = tables.trial_balances.get(&id).map(TrialBalance::version);
        let version = next_version(stored, trial_balance.version(), "trial balance", id)?;

        let mut saved = trial_balance.clone();
        saved.set_version(version);
        tables.trial_balances.insert(saved.id(), saved);
        Ok(version)
    }
}
