//! Ledger events for the observability collaborator.

use std::sync::Mutex;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{AccountingPeriodId, JournalEntryId, TrialBalanceId};

use crate::ledger::ApprovalStatus;

/// A state transition worth telling the outside world about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A draft entry was stored.
    EntryRecorded {
        /// Entry id.
        entry_id: JournalEntryId,
        /// Booking date.
        date: NaiveDate,
        /// Owning period.
        period_id: AccountingPeriodId,
    },
    /// An entry moved to `Posted`.
    EntryPosted {
        /// Entry id.
        entry_id: JournalEntryId,
        /// Owning period.
        period_id: AccountingPeriodId,
        /// Sum of the debit side.
        amount: Decimal,
        /// Actor.
        posted_by: String,
    },
    /// A draft entry was approved or rejected.
    EntryReviewed {
        /// Entry id.
        entry_id: JournalEntryId,
        /// Approved or rejected.
        outcome: ApprovalStatus,
        /// Actor.
        reviewer: String,
    },
    /// A period was created.
    PeriodOpened {
        /// Period id.
        period_id: AccountingPeriodId,
        /// Period name.
        name: String,
    },
    /// A period was closed.
    PeriodClosed {
        /// Period id.
        period_id: AccountingPeriodId,
        /// Actor.
        closed_by: String,
    },
    /// A closed period was reopened.
    PeriodReopened {
        /// Period id.
        period_id: AccountingPeriodId,
        /// Actor.
        reopened_by: String,
    },
    /// A draft trial balance was generated or refreshed.
    TrialBalanceGenerated {
        /// Trial balance id.
        trial_balance_id: TrialBalanceId,
        /// Period it covers.
        period_id: AccountingPeriodId,
    },
    /// A trial balance was finalized.
    TrialBalanceFinalized {
        /// Trial balance id.
        trial_balance_id: TrialBalanceId,
        /// Actor.
        finalized_by: String,
    },
}

impl LedgerEvent {
    /// Short event name for log fields.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EntryRecorded { .. } => "entry_recorded",
            Self::EntryPosted { .. } => "entry_posted",
            Self::EntryReviewed { .. } => "entry_reviewed",
            Self::PeriodOpened { .. } => "period_opened",
            Self::PeriodClosed { .. } => "period_closed",
            Self::PeriodReopened { .. } => "period_reopened",
            Self::TrialBalanceGenerated { .. } => "trial_balance_generated",
            Self::TrialBalanceFinalized { .. } => "trial_balance_finalized",
        }
    }
}

/// Receives ledger events.
///
/// Publishing is fire-and-forget: a sink cannot fail the operation that
/// produced the event.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn publish(&self, event: &LedgerEvent);
}

/// Writes every event as a `tracing` info record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &LedgerEvent) {
        tracing::info!(event = event.name(), details = ?event, "ledger event");
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything published so far.
    #[must_use]
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Names of published events, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(LedgerEvent::name).collect()
    }
}

impl EventSink for CollectingEventSink {
    fn publish(&self, event: &LedgerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
