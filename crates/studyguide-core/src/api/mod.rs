//! REST client for the catalog backend.
//!
//! This module provides the `ApiClient` for fetching exam, scholarship and
//! guide collections, and the `CatalogSource` trait through which the rest
//! of the crate consumes them. Pagination is assembled here; callers only
//! ever see full collections.

pub mod client;
pub mod error;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::{CatalogSource, RemoteCollection};
