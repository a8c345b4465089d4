//! Posting service: orchestrates entries, periods and trial balances.
//!
//! Every operation follows read, mutate in memory, write back. Writes are
//! version compare-and-swaps; a lost race is reloaded and re-validated up to
//! `max_conflict_retries` times before the conflict is surfaced.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use tally_shared::config::LedgerConfig;
use tally_shared::types::{AccountingPeriodId, DateRange, JournalEntryId, TrialBalanceId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::events::{EventSink, LedgerEvent, TracingEventSink};
use super::ports::{
    AccountingPeriodRepository, JournalEntryRepository, PeriodFence, TrialBalanceRepository,
};
use crate::fiscal::{
    AccountingPeriod, NewAccountingPeriod, PeriodType, PeriodUpdate, generate_periods,
};
use crate::ledger::validation::{require_text, validate_balance};
use crate::ledger::{EntryStatus, JournalEntry, LedgerError, NewJournalEntry};
use crate::reports::{AccountClassifier, EquityBasis, TrialBalance, compute_snapshot, posted_totals};

/// Orchestrates posting, period lifecycle and trial balances.
pub struct PostingService<E, P, T>
where
    E: JournalEntryRepository,
    P: AccountingPeriodRepository,
    T: TrialBalanceRepository,
{
    entries: Arc<E>,
    periods: Arc<P>,
    trial_balances: Arc<T>,
    classifier: Arc<dyn AccountClassifier>,
    events: Arc<dyn EventSink>,
    config: LedgerConfig,
    cancel: CancellationToken,
}

impl<E, P, T> PostingService<E, P, T>
where
    E: JournalEntryRepository,
    P: AccountingPeriodRepository,
    T: TrialBalanceRepository,
{
    /// Create a new posting service with default ledger rules.
    #[must_use]
    pub fn new(
        entries: Arc<E>,
        periods: Arc<P>,
        trial_balances: Arc<T>,
        classifier: Arc<dyn AccountClassifier>,
    ) -> Self {
        Self {
            entries,
            periods,
            trial_balances,
            classifier,
            events: Arc::new(TracingEventSink),
            config: LedgerConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use the given ledger rules.
    #[must_use]
    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    /// Publish events to the given sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Abort writes once the token is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The ledger rules in effect.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========================================================================
    // Journal entries
    // ========================================================================

    /// Stores a new draft entry.
    ///
    /// The entry's date must fall inside a known period. Drafts may be
    /// recorded into a closed period; they cannot be posted until it reopens.
    ///
    /// # Errors
    ///
    /// - `InvalidLine` for a rejected line
    /// - `NoPeriodForDate` if no period covers the date
    /// - `Cancelled` if cancelled before the write
    pub async fn record_entry(
        &self,
        input: NewJournalEntry,
    ) -> Result<JournalEntry, LedgerError> {
        let mut entry = JournalEntry::from_input(input)?;
        let period = self.period_for(entry.date()).await?;

        self.check_cancelled()?;
        let version = self.entries.save(&entry, None).await?;
        entry.set_version(version);

        info!(
            entry_id = %entry.id(),
            period_id = %period.id(),
            lines = entry.lines().len(),
            "Journal entry recorded"
        );
        self.events.publish(&LedgerEvent::EntryRecorded {
            entry_id: entry.id(),
            date: entry.date(),
            period_id: period.id(),
        });
        Ok(entry)
    }

    /// Applies an edit to a draft entry and stores it.
    ///
    /// The edit runs against a fresh copy on every attempt. The (possibly
    /// changed) date must still fall inside a known period. Posting and
    /// review go through [`Self::post_entry`], [`Self::approve_entry`] and
    /// [`Self::reject_entry`]; an edit that changes either status is refused.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound`
    /// - `EntryImmutable` if the entry is posted
    /// - whatever the edit returns
    /// - `StatusChangedByEdit` if the edit posted, approved or rejected it
    /// - `NoPeriodForDate` for the resulting date
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn edit_entry<F>(
        &self,
        id: JournalEntryId,
        edit: F,
    ) -> Result<JournalEntry, LedgerError>
    where
        F: Fn(&mut JournalEntry) -> Result<(), LedgerError> + Send + Sync,
    {
        let edit = &edit;
        self.with_retry("edit_entry", move || self.try_edit_entry(id, edit))
            .await
    }

    async fn try_edit_entry<F>(
        &self,
        id: JournalEntryId,
        edit: &F,
    ) -> Result<JournalEntry, LedgerError>
    where
        F: Fn(&mut JournalEntry) -> Result<(), LedgerError> + Send + Sync,
    {
        let mut entry = self.load_entry(id).await?;
        if entry.is_posted() {
            return Err(LedgerError::EntryImmutable(id));
        }
        let approval = entry.approval_status();
        edit(&mut entry)?;
        if entry.status() != EntryStatus::Draft || entry.approval_status() != approval {
            warn!(entry_id = %id, status = %entry.status(), "Edit tried to change entry status");
            return Err(LedgerError::StatusChangedByEdit(id));
        }
        self.period_for(entry.date()).await?;

        self.check_cancelled()?;
        let version = self.entries.save(&entry, None).await?;
        entry.set_version(version);

        debug!(entry_id = %id, version, "Journal entry updated");
        Ok(entry)
    }

    /// Posts a draft entry.
    ///
    /// Loads the entry, finds the period containing its date, requires the
    /// period to be open and the entry to balance, then writes the posted
    /// entry fenced on the period version that was checked.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound`
    /// - `AlreadyPosted`
    /// - `NoPeriodForDate`
    /// - `PeriodClosed`, also when a close wins a race with this call
    /// - `NotBalanced` (entry stays draft)
    /// - `MissingField` for a blank actor
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn post_entry(
        &self,
        id: JournalEntryId,
        posted_by: &str,
    ) -> Result<JournalEntry, LedgerError> {
        require_text("posted_by", posted_by)?;
        let posted_by = posted_by.trim();
        self.with_retry("post_entry", move || self.try_post_entry(id, posted_by))
            .await
    }

    async fn try_post_entry(
        &self,
        id: JournalEntryId,
        posted_by: &str,
    ) -> Result<JournalEntry, LedgerError> {
        let mut entry = self.load_entry(id).await?;
        if entry.status() == EntryStatus::Posted {
            return Err(LedgerError::AlreadyPosted(id));
        }

        let period = self.open_period_for(entry.date()).await?;

        let tolerance = self.config.balance_tolerance;
        if let Err(err) = validate_balance(id, entry.balance(), tolerance) {
            debug!(
                entry_id = %id,
                difference = %entry.difference(),
                "Entry rejected as unbalanced"
            );
            return Err(err);
        }
        entry.post(posted_by, tolerance)?;

        self.check_cancelled()?;
        let version = self.entries.save(&entry, Some(PeriodFence::of(&period))).await?;
        entry.set_version(version);

        let amount = entry.balance().total_debit;
        info!(
            entry_id = %id,
            period_id = %period.id(),
            amount = %amount,
            posted_by,
            "Journal entry posted"
        );
        self.events.publish(&LedgerEvent::EntryPosted {
            entry_id: id,
            period_id: period.id(),
            amount,
            posted_by: posted_by.to_string(),
        });
        Ok(entry)
    }

    /// Approves a draft entry.
    ///
    /// Approval is review metadata; it does not gate posting.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound`
    /// - `EntryImmutable` if the entry is posted
    /// - `AlreadyApproved`
    /// - `MissingField` for a blank approver
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn approve_entry(
        &self,
        id: JournalEntryId,
        approver_name: &str,
    ) -> Result<JournalEntry, LedgerError> {
        require_text("approver_name", approver_name)?;
        let approver_name = approver_name.trim();
        self.with_retry("approve_entry", move || {
            self.try_review_entry(id, approver_name, JournalEntry::approve)
        })
        .await
    }

    /// Rejects a draft entry.
    ///
    /// A rejected draft can be corrected and approved later.
    ///
    /// # Errors
    ///
    /// - `EntryNotFound`
    /// - `EntryImmutable` if the entry is posted
    /// - `AlreadyRejected`
    /// - `MissingField` for a blank reviewer
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn reject_entry(
        &self,
        id: JournalEntryId,
        rejected_by: &str,
    ) -> Result<JournalEntry, LedgerError> {
        require_text("rejected_by", rejected_by)?;
        let rejected_by = rejected_by.trim();
        self.with_retry("reject_entry", move || {
            self.try_review_entry(id, rejected_by, JournalEntry::reject)
        })
        .await
    }

    async fn try_review_entry(
        &self,
        id: JournalEntryId,
        reviewer: &str,
        review: fn(&mut JournalEntry, &str) -> Result<(), LedgerError>,
    ) -> Result<JournalEntry, LedgerError> {
        let mut entry = self.load_entry(id).await?;
        review(&mut entry, reviewer)?;

        self.check_cancelled()?;
        let version = self.entries.save(&entry, None).await?;
        entry.set_version(version);

        let outcome = entry.approval_status();
        info!(entry_id = %id, reviewer, %outcome, "Journal entry reviewed");
        self.events.publish(&LedgerEvent::EntryReviewed {
            entry_id: id,
            outcome,
            reviewer: reviewer.to_string(),
        });
        Ok(entry)
    }

    /// Returns an entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if it does not exist.
    pub async fn entry(&self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        self.load_entry(id).await
    }

    // ========================================================================
    // Accounting periods
    // ========================================================================

    /// Creates an open period.
    ///
    /// # Errors
    ///
    /// - `MissingField` for a blank name
    /// - `OverlappingPeriod` if the range overlaps a stored period
    /// - `Cancelled`
    pub async fn open_period(
        &self,
        input: NewAccountingPeriod,
    ) -> Result<AccountingPeriod, LedgerError> {
        let mut period = AccountingPeriod::create(input)?;

        self.check_cancelled()?;
        let version = self.periods.save(&period).await?;
        period.set_version(version);

        info!(
            period_id = %period.id(),
            name = period.name(),
            range = %period.range(),
            "Accounting period opened"
        );
        self.events.publish(&LedgerEvent::PeriodOpened {
            period_id: period.id(),
            name: period.name().to_string(),
        });
        Ok(period)
    }

    /// Opens every period of a fiscal year.
    ///
    /// Periods are opened in order; on failure the ones already opened stay.
    ///
    /// # Errors
    ///
    /// Same as [`Self::open_period`], plus `InvalidDateRange` for a
    /// degenerate trailing period.
    pub async fn generate_calendar(
        &self,
        fiscal_year: i32,
        year: DateRange,
        period_type: PeriodType,
    ) -> Result<Vec<AccountingPeriod>, LedgerError> {
        let mut opened = Vec::new();
        for input in generate_periods(fiscal_year, year, period_type)? {
            opened.push(self.open_period(input).await?);
        }
        info!(fiscal_year, periods = opened.len(), "Fiscal calendar generated");
        Ok(opened)
    }

    /// Renames or re-dates an open period.
    ///
    /// # Errors
    ///
    /// - `PeriodNotFound`
    /// - `PeriodNotEditable` if closed
    /// - `InvalidDateRange`, `MissingField`, `OverlappingPeriod`
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn update_period(
        &self,
        id: AccountingPeriodId,
        update: PeriodUpdate,
    ) -> Result<AccountingPeriod, LedgerError> {
        let update = &update;
        self.with_retry("update_period", move || self.try_update_period(id, update.clone()))
            .await
    }

    async fn try_update_period(
        &self,
        id: AccountingPeriodId,
        update: PeriodUpdate,
    ) -> Result<AccountingPeriod, LedgerError> {
        let mut period = self.load_period(id).await?;
        if !period.update(update)? {
            return Ok(period);
        }

        self.check_cancelled()?;
        let version = self.periods.save(&period).await?;
        period.set_version(version);

        debug!(period_id = %id, version, "Accounting period updated");
        Ok(period)
    }

    /// Closes a period.
    ///
    /// # Errors
    ///
    /// - `PeriodNotFound`
    /// - `PeriodAlreadyClosed` (state unchanged)
    /// - `UnpostedEntriesExist` if a draft is dated inside the period
    /// - `TrialBalanceNotBalanced` if required by configuration
    /// - `MissingField` for a blank actor
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn close_period(
        &self,
        id: AccountingPeriodId,
        closed_by: &str,
    ) -> Result<AccountingPeriod, LedgerError> {
        require_text("closed_by", closed_by)?;
        let closed_by = closed_by.trim();
        self.with_retry("close_period", move || self.try_close_period(id, closed_by))
            .await
    }

    async fn try_close_period(
        &self,
        id: AccountingPeriodId,
        closed_by: &str,
    ) -> Result<AccountingPeriod, LedgerError> {
        let mut period = self.load_period(id).await?;
        period.close(closed_by)?;

        let entries = self.entries.list_in_range(period.range()).await?;
        let drafts = entries.iter().filter(|entry| !entry.is_posted()).count();
        if drafts > 0 {
            debug!(period_id = %id, drafts, "Close blocked by draft entries");
            return Err(LedgerError::UnpostedEntriesExist {
                period_id: id,
                count: drafts,
            });
        }

        if self.config.require_balanced_trial_balance_on_close {
            let totals = posted_totals(&entries, period.range())?;
            if !totals.is_balanced(self.config.balance_tolerance) {
                return Err(LedgerError::TrialBalanceNotBalanced {
                    debit: totals.total_debit,
                    credit: totals.total_credit,
                });
            }
        }

        self.check_cancelled()?;
        let version = self.periods.save(&period).await?;
        period.set_version(version);

        info!(
            period_id = %id,
            closed_by,
            posted_entries = entries.len(),
            "Accounting period closed"
        );
        self.events.publish(&LedgerEvent::PeriodClosed {
            period_id: id,
            closed_by: closed_by.to_string(),
        });
        Ok(period)
    }

    /// Reopens a closed period.
    ///
    /// # Errors
    ///
    /// - `PeriodNotFound`
    /// - `PeriodNotClosed` if already open
    /// - `MissingField` for a blank actor
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn reopen_period(
        &self,
        id: AccountingPeriodId,
        reopened_by: &str,
    ) -> Result<AccountingPeriod, LedgerError> {
        require_text("reopened_by", reopened_by)?;
        let reopened_by = reopened_by.trim();
        self.with_retry("reopen_period", move || self.try_reopen_period(id, reopened_by))
            .await
    }

    async fn try_reopen_period(
        &self,
        id: AccountingPeriodId,
        reopened_by: &str,
    ) -> Result<AccountingPeriod, LedgerError> {
        let mut period = self.load_period(id).await?;
        period.reopen()?;

        self.check_cancelled()?;
        let version = self.periods.save(&period).await?;
        period.set_version(version);

        info!(period_id = %id, reopened_by, "Accounting period reopened");
        self.events.publish(&LedgerEvent::PeriodReopened {
            period_id: id,
            reopened_by: reopened_by.to_string(),
        });
        Ok(period)
    }

    /// Returns a period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` if it does not exist.
    pub async fn period(&self, id: AccountingPeriodId) -> Result<AccountingPeriod, LedgerError> {
        self.load_period(id).await
    }

    // ========================================================================
    // Trial balances
    // ========================================================================

    /// Computes and stores a draft trial balance for a period.
    ///
    /// # Errors
    ///
    /// - `PeriodNotFound`
    /// - `MissingField` for a blank number
    /// - `AccountNotClassified`
    /// - `Cancelled`
    pub async fn generate_trial_balance(
        &self,
        period_id: AccountingPeriodId,
        number: &str,
        include_zero_balances: bool,
    ) -> Result<TrialBalance, LedgerError> {
        let period = self.load_period(period_id).await?;
        let entries = self.entries.list_in_range(period.range()).await?;
        let snapshot = compute_snapshot(
            &entries,
            period.range(),
            self.classifier.as_ref(),
            include_zero_balances,
        )?;
        let mut trial_balance =
            TrialBalance::generate(number, &period, snapshot, include_zero_balances)?;

        self.check_cancelled()?;
        let version = self.trial_balances.save(&trial_balance).await?;
        trial_balance.set_version(version);

        info!(
            trial_balance_id = %trial_balance.id(),
            period_id = %period_id,
            total_debits = %trial_balance.total_debits(),
            total_credits = %trial_balance.total_credits(),
            "Trial balance generated"
        );
        self.events.publish(&LedgerEvent::TrialBalanceGenerated {
            trial_balance_id: trial_balance.id(),
            period_id,
        });
        Ok(trial_balance)
    }

    /// Recomputes a draft trial balance from the current ledger.
    ///
    /// The period is reloaded, so a re-dated period is picked up.
    ///
    /// # Errors
    ///
    /// - `TrialBalanceNotFound`
    /// - `TrialBalanceFinalized`
    /// - `PeriodNotFound`
    /// - `AccountNotClassified`
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn refresh_trial_balance(
        &self,
        id: TrialBalanceId,
    ) -> Result<TrialBalance, LedgerError> {
        self.with_retry("refresh_trial_balance", move || self.try_refresh_trial_balance(id))
            .await
    }

    async fn try_refresh_trial_balance(
        &self,
        id: TrialBalanceId,
    ) -> Result<TrialBalance, LedgerError> {
        let mut trial_balance = self.load_trial_balance(id).await?;
        if trial_balance.is_finalized() {
            return Err(LedgerError::TrialBalanceFinalized(id));
        }

        let period = self.load_period(trial_balance.period_id()).await?;
        let entries = self.entries.list_in_range(period.range()).await?;
        let snapshot = compute_snapshot(
            &entries,
            period.range(),
            self.classifier.as_ref(),
            trial_balance.include_zero_balances(),
        )?;
        trial_balance.refresh(period.range(), snapshot)?;

        self.check_cancelled()?;
        let version = self.trial_balances.save(&trial_balance).await?;
        trial_balance.set_version(version);

        info!(trial_balance_id = %id, version, "Trial balance refreshed");
        self.events.publish(&LedgerEvent::TrialBalanceGenerated {
            trial_balance_id: id,
            period_id: trial_balance.period_id(),
        });
        Ok(trial_balance)
    }

    /// Finalizes a trial balance.
    ///
    /// # Errors
    ///
    /// - `TrialBalanceNotFound`
    /// - `TrialBalanceFinalized`
    /// - `MissingField` for a blank actor
    /// - `TrialBalanceNotBalanced`, `AccountingEquationViolation`
    /// - `ConcurrencyConflict`, `Cancelled`
    pub async fn finalize_trial_balance(
        &self,
        id: TrialBalanceId,
        finalized_by: &str,
    ) -> Result<TrialBalance, LedgerError> {
        require_text("finalized_by", finalized_by)?;
        let finalized_by = finalized_by.trim();
        self.with_retry("finalize_trial_balance", move || {
            self.try_finalize_trial_balance(id, finalized_by)
        })
        .await
    }

    async fn try_finalize_trial_balance(
        &self,
        id: TrialBalanceId,
        finalized_by: &str,
    ) -> Result<TrialBalance, LedgerError> {
        let mut trial_balance = self.load_trial_balance(id).await?;
        let basis = EquityBasis::from_flag(self.config.include_net_income_in_equity);
        let tolerance = self.config.balance_tolerance;
        if let Err(err) = trial_balance.finalize(finalized_by, tolerance, basis) {
            warn!(trial_balance_id = %id, error = %err, "Trial balance rejected");
            return Err(err);
        }

        self.check_cancelled()?;
        let version = self.trial_balances.save(&trial_balance).await?;
        trial_balance.set_version(version);

        info!(trial_balance_id = %id, finalized_by, "Trial balance finalized");
        self.events.publish(&LedgerEvent::TrialBalanceFinalized {
            trial_balance_id: id,
            finalized_by: finalized_by.to_string(),
        });
        Ok(trial_balance)
    }

    /// Returns a trial balance.
    ///
    /// # Errors
    ///
    /// Returns `TrialBalanceNotFound` if it does not exist.
    pub async fn trial_balance(&self, id: TrialBalanceId) -> Result<TrialBalance, LedgerError> {
        self.load_trial_balance(id).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn load_entry(&self, id: JournalEntryId) -> Result<JournalEntry, LedgerError> {
        self.entries
            .get(id)
            .await?
            .ok_or(LedgerError::EntryNotFound(id))
    }

    async fn load_period(&self, id: AccountingPeriodId) -> Result<AccountingPeriod, LedgerError> {
        self.periods
            .get(id)
            .await?
            .ok_or(LedgerError::PeriodNotFound(id))
    }

    async fn load_trial_balance(&self, id: TrialBalanceId) -> Result<TrialBalance, LedgerError> {
        self.trial_balances
            .get(id)
            .await?
            .ok_or(LedgerError::TrialBalanceNotFound(id))
    }

    async fn period_for(&self, date: NaiveDate) -> Result<AccountingPeriod, LedgerError> {
        self.periods
            .find_by_date(date)
            .await?
            .ok_or(LedgerError::NoPeriodForDate(date))
    }

    async fn open_period_for(&self, date: NaiveDate) -> Result<AccountingPeriod, LedgerError> {
        let period = self.period_for(date).await?;
        if !period.is_open() {
            debug!(period_id = %period.id(), %date, "Posting rejected by closed period");
            return Err(LedgerError::PeriodClosed(period.id()));
        }
        Ok(period)
    }

    fn check_cancelled(&self) -> Result<(), LedgerError> {
        if self.cancel.is_cancelled() {
            return Err(LedgerError::Cancelled);
        }
        Ok(())
    }

    async fn with_retry<R, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt_once: F,
    ) -> Result<R, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, LedgerError>>,
    {
        let mut attempt = 0;
        loop {
            match attempt_once().await {
                Err(err) if err.is_retryable() && attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    warn!(operation, attempt, error = %err, "Concurrent modification, retrying");
                }
                Err(err) if err.is_retryable() => {
                    warn!(operation, attempt, error = %err, "Concurrent modification, giving up");
                    return Err(err);
                }
                result => return result,
            }
        }
    }
}
