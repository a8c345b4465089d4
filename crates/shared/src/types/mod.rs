//! Common types used across the application.

pub mod amount;
pub mod date_range;
pub mod id;


pub use amount::Tolerance;
pub use date_range::DateRange;
pub use id::*;
