//! Posting orchestration.
//!
//! - Persistence ports, one per aggregate, with version compare-and-swap
//! - Ledger events and the sinks that receive them
//! - `PostingService`, which validates and commits every state transition

pub mod events;
pub mod ports;
pub mod service;

pub use events::{CollectingEventSink, EventSink, LedgerEvent, TracingEventSink};
pub use ports::{
    AccountingPeriodRepository, JournalEntryRepository, PeriodFence, TrialBalanceRepository,
};
pub use service::PostingService;
