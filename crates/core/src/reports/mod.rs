//! Trial balance generation.
//!
//! This module provides pure business logic for the period trial balance:
//! - Per-account aggregation of posted lines
//! - Account classification and class totals
//! - The Draft -> Finalized lifecycle with balance and equation checks

pub mod classifier;
pub mod trial_balance;
pub mod types;


pub use classifier::{AccountClassifier, ChartOfAccounts};
pub use trial_balance::{TrialBalance, TrialBalanceSnapshot, compute_snapshot, posted_totals};
pub use types::*;
