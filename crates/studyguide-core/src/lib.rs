//! Client-side data layer for the study guide app.
//!
//! Fetches the exam, scholarship and guide catalogs from the backend, keeps
//! them in a local TTL cache with stale fallback, manages bookmarks, and
//! derives filtered views from user filter inputs. UI shells drive it through
//! [`AppState`].

pub mod api;
pub mod app;
pub mod bookmarks;
pub mod cache;
pub mod config;
pub mod filter;
pub mod models;
pub mod preferences;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use app::{AppState, RefreshReport};
pub use config::Config;
