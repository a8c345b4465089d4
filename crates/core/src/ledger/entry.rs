//! Journal entry aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountId, JournalEntryId, LedgerLineId, Tolerance};

use super::error::LedgerError;
use super::line::LedgerLine;
use super::types::{
    ApprovalStatus, BalanceTotals, EntryStatus, EntryUpdate, MANUAL_ENTRY_SOURCE, NewJournalEntry,
};
use super::validation::{require_text, validate_balance};

/// A journal entry: an ordered set of debit/credit lines booked on one date.
///
/// Created as `Draft`, mutable only while `Draft`, and immutable once
/// `Posted`. There is no way back from `Posted`; corrections are new entries.
/// A draft may be approved or rejected by a reviewer; the outcome is kept
/// as metadata and frozen once the entry posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    id: JournalEntryId,
    date: NaiveDate,
    reference_number: Option<String>,
    description: String,
    source: String,
    status: EntryStatus,
    lines: Vec<LedgerLine>,
    posted_by: Option<String>,
    posted_on: Option<DateTime<Utc>>,
    approval_status: ApprovalStatus,
    approver_name: Option<String>,
    reviewed_on: Option<DateTime<Utc>>,
    version: u64,
}

impl JournalEntry {
    /// Creates an empty draft entry.
    #[must_use]
    pub fn new(date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: JournalEntryId::new(),
            date,
            reference_number: None,
            description: description.into(),
            source: MANUAL_ENTRY_SOURCE.to_string(),
            status: EntryStatus::Draft,
            lines: Vec::new(),
            posted_by: None,
            posted_on: None,
            approval_status: ApprovalStatus::Pending,
            approver_name: None,
            reviewed_on: None,
            version: 0,
        }
    }

    /// Builds a draft entry and all of its lines from recording input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidLine` for the first line with bad amounts.
    pub fn from_input(input: NewJournalEntry) -> Result<Self, LedgerError> {
        let mut entry = Self::new(input.date, input.description);
        entry.reference_number = input.reference_number;
        if let Some(source) = input.source {
            entry.source = source;
        }
        for line in input.lines {
            entry.add_line(line.account_id, line.debit, line.credit, line.description)?;
        }
        Ok(entry)
    }

    /// Sets the reference number.
    #[must_use]
    pub fn with_reference(mut self, reference_number: impl Into<String>) -> Self {
        self.reference_number = Some(reference_number.into());
        self
    }

    /// Sets the originating module.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Entry id.
    #[must_use]
    pub fn id(&self) -> JournalEntryId {
        self.id
    }

    /// Booking date.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// External reference.
    #[must_use]
    pub fn reference_number(&self) -> Option<&str> {
        self.reference_number.as_deref()
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Originating module.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> EntryStatus {
        self.status
    }

    /// Returns true once posted.
    #[must_use]
    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LedgerLine] {
        &self.lines
    }

    /// Who posted the entry.
    #[must_use]
    pub fn posted_by(&self) -> Option<&str> {
        self.posted_by.as_deref()
    }

    /// When the entry was posted.
    #[must_use]
    pub fn posted_on(&self) -> Option<DateTime<Utc>> {
        self.posted_on
    }

    /// Review outcome.
    #[must_use]
    pub fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }

    /// Who approved or rejected the entry.
    #[must_use]
    pub fn approver_name(&self) -> Option<&str> {
        self.approver_name.as_deref()
    }

    /// When the entry was approved or rejected.
    #[must_use]
    pub fn reviewed_on(&self) -> Option<DateTime<Utc>> {
        self.reviewed_on
    }

    /// Optimistic concurrency version. Zero until first saved.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stamps the version assigned by a successful save.
    ///
    /// Only persistence adapters call this.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    // ------------------------------------------------------------------
    // Draft mutations
    // ------------------------------------------------------------------

    /// Appends a line.
    ///
    /// # Errors
    ///
    /// - `EntryImmutable` if the entry is posted
    /// - `InvalidLine` if the amounts are not one-sided and non-negative
    pub fn add_line(
        &mut self,
        account_id: AccountId,
        debit: Decimal,
        credit: Decimal,
        description: Option<String>,
    ) -> Result<LedgerLineId, LedgerError> {
        self.ensure_editable()?;
        let line = LedgerLine::new(self.id, account_id, debit, credit, description)?;
        let line_id = line.id();
        self.lines.push(line);
        Ok(line_id)
    }

    /// Replaces the amounts of an existing line.
    ///
    /// # Errors
    ///
    /// - `EntryImmutable` if the entry is posted
    /// - `LineNotFound` if the line is not on this entry
    /// - `InvalidLine` if the new amounts are rejected (line unchanged)
    pub fn update_line(
        &mut self,
        line_id: LedgerLineId,
        debit: Decimal,
        credit: Decimal,
    ) -> Result<(), LedgerError> {
        self.ensure_editable()?;
        let entry_id = self.id;
        let line = self
            .lines
            .iter_mut()
            .find(|line| line.id() == line_id)
            .ok_or(LedgerError::LineNotFound { entry_id, line_id })?;
        line.set_amounts(debit, credit)
    }

    /// Removes a line and returns it.
    ///
    /// # Errors
    ///
    /// - `EntryImmutable` if the entry is posted
    /// - `LineNotFound` if the line is not on this entry
    pub fn remove_line(&mut self, line_id: LedgerLineId) -> Result<LedgerLine, LedgerError> {
        self.ensure_editable()?;
        let index = self
            .lines
            .iter()
            .position(|line| line.id() == line_id)
            .ok_or(LedgerError::LineNotFound {
                entry_id: self.id,
                line_id,
            })?;
        Ok(self.lines.remove(index))
    }

    /// Updates header fields. Returns true if anything changed.
    ///
    /// # Errors
    ///
    /// Returns `EntryImmutable` if the entry is posted.
    pub fn update(&mut self, update: EntryUpdate) -> Result<bool, LedgerError> {
        self.ensure_editable()?;

        let mut changed = false;
        if let Some(date) = update.date
            && date != self.date
        {
            self.date = date;
            changed = true;
        }
        if let Some(reference) = update.reference_number
            && self.reference_number.as_deref() != Some(reference.as_str())
        {
            self.reference_number = Some(reference);
            changed = true;
        }
        if let Some(description) = update.description
            && description != self.description
        {
            self.description = description;
            changed = true;
        }
        if let Some(source) = update.source
            && source != self.source
        {
            self.source = source;
            changed = true;
        }
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Balance
    // ------------------------------------------------------------------

    /// Returns the debit and credit totals.
    #[must_use]
    pub fn balance(&self) -> BalanceTotals {
        self.lines
            .iter()
            .fold(BalanceTotals::ZERO, |totals, line| {
                totals.add(line.debit(), line.credit())
            })
    }

    /// Returns total debits minus total credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.balance().difference()
    }

    /// Returns true if the entry balances within the tolerance.
    #[must_use]
    pub fn is_balanced(&self, tolerance: Tolerance) -> bool {
        self.balance().is_balanced(tolerance)
    }

    // ------------------------------------------------------------------
    // Posting
    // ------------------------------------------------------------------

    /// Moves the entry from `Draft` to `Posted`.
    ///
    /// On failure the entry is left untouched.
    ///
    /// # Errors
    ///
    /// - `AlreadyPosted` if already posted
    /// - `MissingField` if `posted_by` is blank
    /// - `NotBalanced` if debits and credits differ by the tolerance or more
    pub fn post(&mut self, posted_by: &str, tolerance: Tolerance) -> Result<(), LedgerError> {
        if self.is_posted() {
            return Err(LedgerError::AlreadyPosted(self.id));
        }
        require_text("posted_by", posted_by)?;
        validate_balance(self.id, self.balance(), tolerance)?;

        self.status = EntryStatus::Posted;
        self.posted_by = Some(posted_by.trim().to_string());
        self.posted_on = Some(Utc::now());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Review
    // ------------------------------------------------------------------

    /// Marks a draft as approved.
    ///
    /// A rejected draft may still be approved after corrections.
    ///
    /// # Errors
    ///
    /// - `EntryImmutable` if the entry is posted
    /// - `AlreadyApproved` if already approved
    /// - `MissingField` if `approver_name` is blank
    pub fn approve(&mut self, approver_name: &str) -> Result<(), LedgerError> {
        self.ensure_editable()?;
        if self.approval_status == ApprovalStatus::Approved {
            return Err(LedgerError::AlreadyApproved(self.id));
        }
        require_text("approver_name", approver_name)?;
        self.review(ApprovalStatus::Approved, approver_name);
        Ok(())
    }

    /// Marks a draft as rejected.
    ///
    /// # Errors
    ///
    /// - `EntryImmutable` if the entry is posted
    /// - `AlreadyRejected` if already rejected
    /// - `MissingField` if `rejected_by` is blank
    pub fn reject(&mut self, rejected_by: &str) -> Result<(), LedgerError> {
        self.ensure_editable()?;
        if self.approval_status == ApprovalStatus::Rejected {
            return Err(LedgerError::AlreadyRejected(self.id));
        }
        require_text("rejected_by", rejected_by)?;
        self.review(ApprovalStatus::Rejected, rejected_by);
        Ok(())
    }

    fn review(&mut self, outcome: ApprovalStatus, reviewer: &str) {
        self.approval_status = outcome;
        self.approver_name = Some(reviewer.trim().to_string());
        self.reviewed_on = Some(Utc::now());
    }

    fn ensure_editable(&self) -> Result<(), LedgerError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(LedgerError::EntryImmutable(self.id))
        }
    }
}
