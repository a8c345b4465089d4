//! Core business logic for Tally.
//!
//! This crate contains pure ledger posting logic with ZERO storage or
//! transport dependencies. Aggregates, state machines and validation rules
//! live here; persistence is reached through the ports in [`posting`].
//!
//! # Modules
//!
//! - `ledger` - Journal entries, ledger lines and the error taxonomy
//! - `fiscal` - Accounting periods and fiscal calendars
//! - `reports` - Trial balance computation and finalization
//! - `posting` - Persistence ports, events and the posting service

pub mod fiscal;
pub mod ledger;
pub mod posting;
pub mod reports;
