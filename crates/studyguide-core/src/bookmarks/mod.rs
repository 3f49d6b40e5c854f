//! Bookmark registry.
//!
//! Bookmarks are a set of (item type, item id) pairs persisted as a JSON
//! list under a single storage key. The registry keeps an in-memory copy for
//! cheap membership queries and re-reads storage before every toggle.

pub mod error;
pub mod registry;

pub use error::BookmarkError;
pub use registry::{BookmarkRegistry, Toggled};
