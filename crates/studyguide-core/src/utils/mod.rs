//! Utility functions for string matching and timestamp handling.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{contains_ignore_case, eq_ignore_case, parse_timestamp, truncate_string};
