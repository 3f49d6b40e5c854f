//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager`, a read-through cache for catalog
//! collections stored in the key-value store. Entries are considered stale
//! after the configured TTL (24 hours by default); stale entries are still
//! served when the remote is unreachable.
//!
//! Cached collections:
//! - Exams
//! - Scholarships
//! - Guides

pub mod error;
pub mod manager;

pub use error::FetchError;
pub use manager::{CacheAges, CacheEntry, CacheManager, DataSource, Fetched};
