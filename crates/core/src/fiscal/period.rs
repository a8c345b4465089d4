//! Accounting period aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{AccountingPeriodId, DateRange};

use crate::ledger::error::LedgerError;
use crate::ledger::validation::require_text;

/// Status of an accounting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Period is open for postings.
    Open,
    /// Period is closed, no postings or structural edits allowed.
    Closed,
}

impl PeriodStatus {
    /// Returns true if postings are allowed.
    #[must_use]
    pub fn allows_posting(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Length of a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// One calendar month.
    Monthly,
    /// Three calendar months.
    Quarterly,
    /// A whole fiscal year.
    Yearly,
}

impl PeriodType {
    /// Number of calendar months the period spans.
    #[must_use]
    pub fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::Yearly => 12,
        }
    }
}

/// Input for opening a new accounting period.
#[derive(Debug, Clone)]
pub struct NewAccountingPeriod {
    /// Period name (e.g., "January 2026").
    pub name: String,
    /// Inclusive date range.
    pub range: DateRange,
    /// Fiscal year the period belongs to.
    pub fiscal_year: i32,
    /// Period length.
    pub period_type: PeriodType,
    /// Year-end adjustment period.
    pub is_adjustment_period: bool,
}

/// Partial update of an open period.
#[derive(Debug, Clone, Default)]
pub struct PeriodUpdate {
    /// New name.
    pub name: Option<String>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
}

/// A calendar bucket that gates postings.
///
/// `Open <-> Closed`. Only one level of closure history is kept: reopening
/// clears `closed_by` and `closed_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingPeriod {
    id: AccountingPeriodId,
    name: String,
    range: DateRange,
    fiscal_year: i32,
    period_type: PeriodType,
    is_adjustment_period: bool,
    status: PeriodStatus,
    closed_by: Option<String>,
    closed_on: Option<DateTime<Utc>>,
    version: u64,
}

impl AccountingPeriod {
    /// Creates an open period.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the name is blank.
    pub fn create(input: NewAccountingPeriod) -> Result<Self, LedgerError> {
        require_text("name", &input.name)?;
        Ok(Self {
            id: AccountingPeriodId::new(),
            name: input.name.trim().to_string(),
            range: input.range,
            fiscal_year: input.fiscal_year,
            period_type: input.period_type,
            is_adjustment_period: input.is_adjustment_period,
            status: PeriodStatus::Open,
            closed_by: None,
            closed_on: None,
            version: 0,
        })
    }

    /// Period id.
    #[must_use]
    pub fn id(&self) -> AccountingPeriodId {
        self.id
    }

    /// Period name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inclusive date range.
    #[must_use]
    pub fn range(&self) -> DateRange {
        self.range
    }

    /// First day of the period.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.range.start()
    }

    /// Last day of the period.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.range.end()
    }

    /// Fiscal year.
    #[must_use]
    pub fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    /// Period length.
    #[must_use]
    pub fn period_type(&self) -> PeriodType {
        self.period_type
    }

    /// Year-end adjustment period.
    #[must_use]
    pub fn is_adjustment_period(&self) -> bool {
        self.is_adjustment_period
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> PeriodStatus {
        self.status
    }

    /// Returns true if postings are allowed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.allows_posting()
    }

    /// Who closed the period.
    #[must_use]
    pub fn closed_by(&self) -> Option<&str> {
        self.closed_by.as_deref()
    }

    /// When the period was closed.
    #[must_use]
    pub fn closed_on(&self) -> Option<DateTime<Utc>> {
        self.closed_on
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

    /// Returns true if the given date falls within this period (inclusive).
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.range.contains(date)
    }

    /// Returns true if the two periods share at least one day.
    #[must_use]
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.range.overlaps(other)
    }

    /// Closes the period.
    ///
    /// The caller checks that no draft entries remain in the range.
    ///
    /// # Errors
    ///
    /// - `PeriodAlreadyClosed` if already closed (state unchanged)
    /// - `MissingField` if `closed_by` is blank
    pub fn close(&mut self, closed_by: &str) -> Result<(), LedgerError> {
        if self.status == PeriodStatus::Closed {
            return Err(LedgerError::PeriodAlreadyClosed(self.id));
        }
        require_text("closed_by", closed_by)?;

        self.status = PeriodStatus::Closed;
        self.closed_by = Some(closed_by.trim().to_string());
        self.closed_on = Some(Utc::now());
        Ok(())
    }

    /// Reopens a closed period and clears its closure metadata.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotClosed` if the period is open.
    pub fn reopen(&mut self) -> Result<(), LedgerError> {
        if self.status != PeriodStatus::Closed {
            return Err(LedgerError::PeriodNotClosed(self.id));
        }

        self.status = PeriodStatus::Open;
        self.closed_by = None;
        self.closed_on = None;
        Ok(())
    }

    /// Updates name and dates of an open period. Returns true if anything
    /// changed.
    ///
    /// # Errors
    ///
    /// - `PeriodNotEditable` if the period is closed
    /// - `MissingField` for a blank name
    /// - `InvalidDateRange` if the new start is not before the new end
    pub fn update(&mut self, update: PeriodUpdate) -> Result<bool, LedgerError> {
        if self.status == PeriodStatus::Closed {
            return Err(LedgerError::PeriodNotEditable(self.id));
        }

        let name = match update.name {
            Some(name) => {
                require_text("name", &name)?;
                name.trim().to_string()
            }
            None => self.name.clone(),
        };
        let range = DateRange::new(
            update.start_date.unwrap_or(self.range.start()),
            update.end_date.unwrap_or(self.range.end()),
        )?;

        let changed = name != self.name || range != self.range;
        self.name = name;
        self.range = range;
        Ok(changed)
    }
}
