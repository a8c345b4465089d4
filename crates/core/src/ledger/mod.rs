//! Double-entry bookkeeping logic.
//!
//! This module implements the journal entry side of the ledger:
//! - Ledger lines (one-sided debits and credits)
//! - The journal entry aggregate and its Draft -> Posted lifecycle
//! - Line and balance validation
//! - Error types for every ledger operation

pub mod entry;
pub mod error;
pub mod line;
pub mod types;
pub mod validation;

#[cfg(test)]
mod entry_props;

pub use entry::JournalEntry;
pub use error::{ErrorCategory, LedgerError, LineRejection};
pub use line::LedgerLine;
pub use types::{
    ApprovalStatus, BalanceTotals, EntryStatus, EntryUpdate, LineInput, NewJournalEntry,
};
