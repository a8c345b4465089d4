//! Persistence layer for Tally.
//!
//! This crate provides the in-memory adapter behind the posting ports
//! defined in `tally-core`: version compare-and-swap on every aggregate,
//! period fences on entry writes, and atomic close and overlap checks.

pub mod memory;

pub use memory::InMemoryLedgerStore;
