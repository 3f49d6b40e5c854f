//! Persistent key-value storage.
//!
//! Values are JSON blobs addressed by string keys. `KeyValueStore` is the
//! interface the rest of the crate uses; it sits on top of a pluggable
//! [`StorageBackend`]:
//!
//! - `FileBackend`: one JSON file per key in an app data directory
//! - `MemoryBackend`: process-local map, used for tests and ephemeral sessions
//!
//! Each component owns a disjoint key namespace (see [`keys`]).

pub mod backend;
pub mod error;
pub mod kv;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use error::StorageError;
pub use kv::KeyValueStore;

/// Logical storage keys.
pub mod keys {
    pub const PREFERENCES: &str = "@app_preferences";
    pub const BOOKMARKS: &str = "@app_bookmarks";
}
