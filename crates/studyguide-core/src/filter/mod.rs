//! In-memory filtering and search over catalog collections.
//!
//! Everything here is a pure function of its inputs: the same items and
//! filter state always produce the same output, in input order. Date
//! boundaries are passed in, never sampled from the clock.

pub mod engine;
pub mod state;

pub use engine::{filter_items, matches, search_all, SearchResults};
pub use state::{DateRange, FilterState, ValidationError, ALL_CATEGORIES, MAX_SEARCH_LENGTH};
