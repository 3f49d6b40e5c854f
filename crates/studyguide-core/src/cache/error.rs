use std::time::Duration;

use thiserror::Error;

use crate::api::ApiError;

/// A collection could not be produced from the network or from cache.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch {key}: {source}")]
    Api {
        key: String,
        #[source]
        source: ApiError,
    },

    #[error("Fetching {key} timed out after {}s", .timeout.as_secs_f32())]
    Timeout { key: String, timeout: Duration },

    #[error("No cached data for {0} while offline")]
    NotCached(String),
}

impl FetchError {
    /// Message suitable for an empty-state screen with a retry action
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Api { source, .. } if source.is_transient() => {
                "Couldn't reach the server. Check your connection and try again.".to_string()
            }
            FetchError::Api { .. } => "Something went wrong loading this list.".to_string(),
            FetchError::Timeout { .. } => "The server took too long to respond. Try again.".to_string(),
            FetchError::NotCached(_) => {
                "Nothing saved for offline use yet. Go online to download it.".to_string()
            }
        }
    }
}
