//! Accounting period management.

pub mod calendar;
pub mod period;

pub use calendar::generate_periods;
pub use period::{AccountingPeriod, NewAccountingPeriod, PeriodStatus, PeriodType, PeriodUpdate};
