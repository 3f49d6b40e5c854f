use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage IO error for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize value for {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse stored value for {key}: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage backend unavailable: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn io(key: &str, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}
